use heladeria::config::FlavorConfig;
use heladeria::models::Cents;
use heladeria::{AppState, Catalog, Ledger, LedgerError, SalesArchive};

fn shared_state(stock: u32) -> AppState {
    let catalog = Catalog::new(vec![FlavorConfig {
        name: "Maracuyá".to_string(),
        stock,
        price: Cents(80),
    }])
    .unwrap();
    AppState::new(
        Ledger::new(&catalog),
        SalesArchive::new(std::env::temp_dir().join("heladeria_concurrency_unused.json")),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sells_never_oversell() {
    let state = shared_state(25);

    let mut tasks = Vec::new();
    for i in 0..40u32 {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            let quantity = 1 + i % 3;
            let mut ledger = state.ledger.write().await;
            ledger.sell("Maracuyá", quantity).map(|receipt| receipt.sale.quantity)
        }));
    }

    let mut sold = 0u32;
    for task in tasks {
        match task.await.unwrap() {
            Ok(quantity) => sold += quantity,
            Err(err) => assert!(
                matches!(err, LedgerError::InsufficientStock { .. }),
                "unexpected error: {err}"
            ),
        }
    }

    let ledger = state.ledger.read().await;
    assert!(sold <= 25);
    assert_eq!(ledger.stock_of("Maracuyá"), Some(25 - sold));
    let recorded: u32 = ledger.sales().iter().map(|sale| sale.quantity).sum();
    assert_eq!(recorded, sold);
    assert_eq!(ledger.total(), Cents(u64::from(sold) * 80));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_see_consistent_snapshots() {
    let state = shared_state(200);

    let writer = {
        let state = state.clone();
        tokio::spawn(async move {
            for _ in 0..100 {
                let _ = state.ledger.write().await.sell("Maracuyá", 2);
            }
        })
    };

    for _ in 0..100 {
        let ledger = state.ledger.read().await;
        let units: u32 = ledger.sales().iter().map(|sale| sale.quantity).sum();
        assert_eq!(ledger.total(), Cents(u64::from(units) * 80));
        assert_eq!(ledger.stock_of("Maracuyá"), Some(200 - units));
        drop(ledger);
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
    assert_eq!(state.ledger.read().await.stock_of("Maracuyá"), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_saves_keep_the_newest_history() {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir()
        .join(format!("heladeria_saves_{}_{}", std::process::id(), nanos))
        .join("ventas.json");

    let catalog = Catalog::new(vec![FlavorConfig {
        name: "Coco Mora".to_string(),
        stock: 100,
        price: Cents(80),
    }])
    .unwrap();
    let state = AppState::new(Ledger::new(&catalog), SalesArchive::new(&path));

    let mut tasks = Vec::new();
    for _ in 0..30 {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            state.ledger.write().await.sell("Coco Mora", 1).unwrap();
            state.archive.save(&state.ledger).await.unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Every sale precedes its own save, and saves finish in snapshot order,
    // so the file on disk must hold all of them.
    let archived: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let ledger = state.ledger.read().await;
    assert_eq!(archived["ventas"].as_array().unwrap().len(), ledger.sales().len());
    assert_eq!(ledger.sales().len(), 30);
    assert_eq!(archived["total_ventas"], serde_json::json!(ledger.total().as_amount()));
    assert_eq!(archived["ventas"][29]["stock_restante"], 70);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
