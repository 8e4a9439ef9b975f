use futures::TryStreamExt as _;
use shipyard_dal::{
    CreateShip, Error, ListingParams, ShipDraft, ShipFilter, ShipPatch, ShipRepositoryImpl,
    ShipType,
};
use sqlx::Executor;
use time::macros::date;

const TEST_DATA: &str = r#"
INSERT INTO ship (id, name, planet, ship_type, prod_date, is_used, speed, crew_size, rating)
VALUES (1, 'Orion III', 'Mars', 'MERCHANT', '2995-03-12', TRUE, 0.82, 617, 1.31);
INSERT INTO ship (id, name, planet, ship_type, prod_date, is_used, speed, crew_size, rating)
VALUES (2, 'Daedalus', 'Jupiter', 'MILITARY', '2991-01-01', FALSE, 0.94, 1620, 2.59);
INSERT INTO ship (id, name, planet, ship_type, prod_date, is_used, speed, crew_size, rating)
VALUES (3, 'Eagle Transporter', 'Earth', 'TRANSPORT', '2989-06-30', TRUE, 0.79, 4527, 1.02);
INSERT INTO ship (id, name, planet, ship_type, prod_date, is_used, speed, crew_size, rating)
VALUES (4, 'Nostromo', 'Saturn', 'MERCHANT', '3003-11-02', FALSE, 0.29, 3, 1.36);
INSERT INTO ship (id, name, planet, ship_type, prod_date, is_used, speed, crew_size, rating)
VALUES (5, 'Serenity', 'Earth', 'TRANSPORT', '3017-08-17', TRUE, 0.61, 9, 8.13);
INSERT INTO ship (id, name, planet, ship_type, prod_date, is_used, speed, crew_size, rating)
VALUES (6, 'orion', 'Neptune', 'MILITARY', '2800-01-01', FALSE, 0.5, 100, 0.18);
"#;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    shipyard_dal::migrate(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

fn new_ship() -> CreateShip {
    CreateShip {
        name: Some("Test".to_string()),
        planet: Some("Earth".to_string()),
        ship_type: Some(ShipType::Transport),
        prod_date: Some(date!(3000 - 05 - 17)),
        is_used: None,
        speed: Some(0.5),
        crew_size: Some(100),
    }
}

#[tokio::test]
async fn test_ship_create() {
    let conn = init_db().await;
    let repo = ShipRepositoryImpl::new(conn);

    let draft = ShipDraft::try_from(new_ship()).unwrap();
    let ship = repo.create(draft).await.unwrap();
    assert_eq!(ship.id, 7);
    assert_eq!(ship.name, "Test");
    assert_eq!(ship.prod_date, date!(3000 - 05 - 17));
    assert!(!ship.is_used);
    assert_eq!(ship.rating, 2.0);

    let stored = repo.get(ship.id).await.unwrap();
    assert_eq!(stored, ship);
}

#[tokio::test]
async fn test_ship_get_and_delete() {
    let conn = init_db().await;
    let repo = ShipRepositoryImpl::new(conn);

    let ship = repo.get(4).await.unwrap();
    assert_eq!(ship.name, "Nostromo");
    assert_eq!(ship.ship_type, ShipType::Merchant);
    assert_eq!(ship.crew_size, 3);

    repo.delete(4).await.unwrap();
    assert!(matches!(repo.get(4).await, Err(Error::RecordNotFound(_))));
    assert!(matches!(repo.delete(4).await, Err(Error::RecordNotFound(_))));
    assert!(matches!(repo.get(1000).await, Err(Error::RecordNotFound(_))));
}

#[tokio::test]
async fn test_ship_update() {
    let conn = init_db().await;
    let repo = ShipRepositoryImpl::new(conn);

    let patch = ShipPatch {
        planet: Some("Venus".to_string()),
        is_used: Some(false),
        ..Default::default()
    };
    let updated = repo.update(1, patch).await.unwrap();
    assert_eq!(updated.id, 1);
    assert_eq!(updated.name, "Orion III");
    assert_eq!(updated.planet, "Venus");
    assert!(!updated.is_used);
    // 80 * 0.82 / 25
    assert_eq!(updated.rating, 2.62);
    assert_eq!(repo.get(1).await.unwrap(), updated);

    let invalid = ShipPatch {
        name: Some("Should not be stored".to_string()),
        crew_size: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        repo.update(1, invalid).await,
        Err(Error::InvalidInput(_))
    ));
    assert_eq!(repo.get(1).await.unwrap(), updated);

    assert!(matches!(
        repo.update(1000, ShipPatch::default()).await,
        Err(Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_ship_listing() {
    let conn = init_db().await;
    let repo = ShipRepositoryImpl::new(conn);

    let all = ShipFilter::default().predicate();
    assert_eq!(repo.count(&all).await.unwrap(), 6);

    let page = repo.list(&all, ListingParams::new(0, 3)).await.unwrap();
    let ids: Vec<i64> = page.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let page = repo.list(&all, ListingParams::new(3, 3)).await.unwrap();
    let ids: Vec<i64> = page.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![4, 5, 6]);

    let params = ListingParams::new(0, 3).with_order(vec!["rating".to_string()]);
    let page = repo.list(&all, params).await.unwrap();
    let ids: Vec<i64> = page.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![6, 3, 1]);

    let params = ListingParams::new(0, 3).with_order(vec!["prod_date".to_string()]);
    let page = repo.list(&all, params).await.unwrap();
    let ids: Vec<i64> = page.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![6, 3, 2]);

    let params = ListingParams::new(0, 3).with_order(vec!["password".to_string()]);
    assert!(matches!(
        repo.list(&all, params).await,
        Err(Error::InvalidOrderByField(_))
    ));
}

#[tokio::test]
async fn test_ship_filtering() {
    let conn = init_db().await;
    let repo = ShipRepositoryImpl::new(conn);

    let filter = ShipFilter {
        name: Some("rion".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.count(&filter.predicate()).await.unwrap(), 2);

    let filter = ShipFilter {
        name: Some("Orion".to_string()),
        ..Default::default()
    };
    let ships = repo
        .list(&filter.predicate(), ListingParams::default())
        .await
        .unwrap();
    assert_eq!(ships.len(), 1);
    assert_eq!(ships[0].id, 1);

    let filter = ShipFilter {
        planet: Some("Earth".to_string()),
        is_used: Some(true),
        min_crew_size: Some(10),
        ..Default::default()
    };
    let ships = repo
        .list(&filter.predicate(), ListingParams::default())
        .await
        .unwrap();
    let ids: Vec<i64> = ships.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![3]);

    let filter = ShipFilter {
        after: Some(date!(2991 - 01 - 01)),
        before: Some(date!(3003 - 11 - 02)),
        ..Default::default()
    };
    let ships = repo
        .list(&filter.predicate(), ListingParams::default())
        .await
        .unwrap();
    let ids: Vec<i64> = ships.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 4]);

    let filter = ShipFilter {
        ship_type: Some(ShipType::Military),
        min_rating: Some(1.0),
        ..Default::default()
    };
    let ships = repo
        .list(&filter.predicate(), ListingParams::default())
        .await
        .unwrap();
    let ids: Vec<i64> = ships.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn test_sql_agrees_with_memory_evaluation() {
    let conn = init_db().await;
    let repo = ShipRepositoryImpl::new(conn);
    let all = repo
        .list(&ShipFilter::default().predicate(), ListingParams::default())
        .await
        .unwrap();

    let filters = [
        ShipFilter {
            min_speed: Some(0.5),
            ..Default::default()
        },
        ShipFilter {
            min_speed: Some(0.3),
            max_speed: Some(0.82),
            ..Default::default()
        },
        ShipFilter {
            max_rating: Some(1.31),
            is_used: Some(false),
            ..Default::default()
        },
        ShipFilter {
            planet: Some("e".to_string()),
            max_crew_size: Some(1620),
            ..Default::default()
        },
        ShipFilter {
            before: Some(date!(2995 - 03 - 12)),
            ship_type: Some(ShipType::Merchant),
            ..Default::default()
        },
        ShipFilter {
            name: Some("Nothing like this".to_string()),
            ..Default::default()
        },
    ];

    for filter in filters {
        let predicate = filter.predicate();
        let from_db: Vec<i64> = repo
            .list(&predicate, ListingParams::default())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        let in_memory: Vec<i64> = all
            .iter()
            .filter(|s| predicate.matches(s))
            .map(|s| s.id)
            .collect();
        assert_eq!(from_db, in_memory, "filter {filter:?}");
        assert_eq!(
            repo.count(&predicate).await.unwrap(),
            in_memory.len() as u64
        );
    }
}

#[tokio::test]
async fn test_concurrent_updates() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("ships.db").display());
    let pool = shipyard_dal::new_pool(&url).await.unwrap();
    shipyard_dal::migrate(&pool).await.unwrap();

    const UPDATES: i32 = 32;
    let repo = ShipRepositoryImpl::new(pool.clone());
    let mut ids = Vec::new();
    for _ in 0..=UPDATES {
        let ship = repo
            .create(ShipDraft::try_from(new_ship()).unwrap())
            .await
            .unwrap();
        ids.push(ship.id);
    }
    let shared_id = ids[0];

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..UPDATES {
        // same ship updated from many tasks
        let repo = ShipRepositoryImpl::new(pool.clone());
        tasks.spawn(async move {
            let patch = ShipPatch {
                crew_size: Some(i + 1),
                ..Default::default()
            };
            repo.update(shared_id, patch).await
        });
        // and different ships at the same time
        let repo = ShipRepositoryImpl::new(pool.clone());
        let id = ids[i as usize + 1];
        tasks.spawn(async move {
            let patch = ShipPatch {
                planet: Some(format!("Planet {i}")),
                ..Default::default()
            };
            repo.update(id, patch).await
        });
    }

    let results = tasks.join_all().await;
    let failed: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert!(failed.is_empty(), "failed updates: {failed:?}");

    let shared = repo.get(shared_id).await.unwrap();
    assert!((1..=UPDATES).contains(&shared.crew_size));
    for (i, id) in ids[1..].iter().enumerate() {
        assert_eq!(repo.get(*id).await.unwrap().planet, format!("Planet {i}"));
    }
}
