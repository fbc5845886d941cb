use super::service::*;
use super::Transition;
use crate::auth::CurrentUser;
use crate::db::repository::{category, client, product, tab, test_support::pool};
use crate::ledger;
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::*;
use sqlx::SqlitePool;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn operator() -> CurrentUser {
    CurrentUser {
        id: 2,
        email: "op@bar.test".into(),
        name: "Operador".into(),
        role: UserRole::Operator,
    }
}

fn admin() -> CurrentUser {
    CurrentUser {
        id: 1,
        email: "dono@bar.test".into(),
        name: "Dono".into(),
        role: UserRole::Admin,
    }
}

struct Menu {
    beer: i64,
    fries: i64,
}

async fn menu(pool: &SqlitePool) -> Menu {
    let cat = category::create(pool, "Cardápio").await.unwrap().id;
    let mut ids = Vec::new();
    for (name, cents) in [("Cerveja", 1500), ("Porção de Fritas", 2500)] {
        let created = product::create(
            pool,
            product::NewProduct {
                name: name.into(),
                price_cents: cents,
                category_id: cat,
            },
        )
        .await
        .unwrap();
        ids.push(created.id);
    }
    Menu {
        beer: ids[0],
        fries: ids[1],
    }
}

async fn open_tab(pool: &SqlitePool, customer: &str) -> Tab {
    create_tab(
        pool,
        TabCreate {
            customer: Some(customer.into()),
            client_id: None,
        },
    )
    .await
    .unwrap()
}

async fn add(pool: &SqlitePool, tab_id: i64, product_id: i64, quantity: i64) -> TabItem {
    add_item(
        pool,
        tab_id,
        TabItemCreate {
            product_id: Some(product_id),
            quantity: Some(quantity),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .item
}

/// Tab with 2 × 15.00 + 1 × 25.00
async fn tab_of_55(pool: &SqlitePool) -> Tab {
    let m = menu(pool).await;
    let t = open_tab(pool, "Mesa 4").await;
    add(pool, t.id, m.beer, 2).await;
    add(pool, t.id, m.fries, 1).await;
    tab::get(pool, t.id).await.unwrap().unwrap()
}

async fn new_client(pool: &SqlitePool) -> i64 {
    client::create(
        pool,
        client::NewClient {
            name: "Seu Zé".into(),
            email: None,
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn status(s: TabStatus) -> TabUpdate {
    TabUpdate {
        status: Some(s),
        ..Default::default()
    }
}

// ========================================================================
// Create
// ========================================================================

#[tokio::test]
async fn test_create_requires_customer() {
    let pool = pool().await;
    let err = create_tab(
        &pool,
        TabCreate {
            customer: Some("   ".into()),
            client_id: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);

    let err = create_tab(
        &pool,
        TabCreate {
            customer: Some("Mesa".into()),
            client_id: Some(99),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientNotFound);
}

// ========================================================================
// Items and totals
// ========================================================================

#[tokio::test]
async fn test_items_drive_total() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;
    assert_eq!(t.total, dec("55.00"));
    assert_eq!(t.items.len(), 2);
    assert_eq!(t.items[0].name, "Cerveja");
    assert_eq!(t.items[0].subtotal, dec("30.00"));

    let beer = &t.items[0];
    let change = update_item(
        &pool,
        t.id,
        beer.id,
        TabItemUpdate {
            quantity: Some(3),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(change.tab.total, dec("70.00"));
    assert_eq!(change.item.quantity, 3);

    let removed = remove_item(&pool, t.id, beer.id).await.unwrap();
    assert_eq!(removed.item_id, beer.id);
    assert_eq!(removed.tab.total, dec("25.00"));
    assert_eq!(removed.tab.items.len(), 1);
}

#[tokio::test]
async fn test_removing_the_double_line_leaves_25() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;
    assert_eq!(t.total, dec("55.00"));

    let double = t.items.iter().find(|i| i.quantity == 2).unwrap();
    let removed = remove_item(&pool, t.id, double.id).await.unwrap();
    assert_eq!(removed.tab.total, dec("25.00"));
}

#[derive(Debug, Clone, Copy)]
enum Edit {
    AddBeers,
    TripleFirstLine,
    DropSecondLine,
}

#[tokio::test]
async fn test_total_is_independent_of_edit_order() {
    let pool = pool().await;
    let m = menu(&pool).await;
    let orders = [
        [Edit::AddBeers, Edit::TripleFirstLine, Edit::DropSecondLine],
        [Edit::AddBeers, Edit::DropSecondLine, Edit::TripleFirstLine],
        [Edit::TripleFirstLine, Edit::AddBeers, Edit::DropSecondLine],
        [Edit::TripleFirstLine, Edit::DropSecondLine, Edit::AddBeers],
        [Edit::DropSecondLine, Edit::AddBeers, Edit::TripleFirstLine],
        [Edit::DropSecondLine, Edit::TripleFirstLine, Edit::AddBeers],
    ];

    let mut totals = Vec::new();
    for (n, order) in orders.iter().enumerate() {
        let t = open_tab(&pool, &format!("Mesa {n}")).await;
        let first = add(&pool, t.id, m.beer, 1).await;
        let second = add(&pool, t.id, m.fries, 1).await;

        for edit in order {
            match edit {
                Edit::AddBeers => {
                    add(&pool, t.id, m.beer, 2).await;
                }
                Edit::TripleFirstLine => {
                    update_item(
                        &pool,
                        t.id,
                        first.id,
                        TabItemUpdate {
                            quantity: Some(3),
                            ..Default::default()
                        },
                    )
                    .await
                    .unwrap();
                }
                Edit::DropSecondLine => {
                    remove_item(&pool, t.id, second.id).await.unwrap();
                }
            }
        }

        let t = tab::get(&pool, t.id).await.unwrap().unwrap();
        let from_lines: Decimal = t.items.iter().map(|i| i.subtotal).sum();
        assert_eq!(t.total, from_lines, "{order:?}");
        totals.push(t.total);
    }
    assert!(totals.iter().all(|total| *total == dec("75.00")), "{totals:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_item_adds_all_commit() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("tabs.db").display());
    let pool = crate::db::DbService::connect(&url).await.unwrap().pool;
    let m = menu(&pool).await;
    let t = open_tab(&pool, "Balcão").await;

    const ADDS: usize = 20;
    let (tab_id, beer) = (t.id, m.beer);
    let tasks: Vec<_> = (0..ADDS)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                add_item(
                    &pool,
                    tab_id,
                    TabItemCreate {
                        product_id: Some(beer),
                        quantity: Some(1),
                        ..Default::default()
                    },
                )
                .await
            })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap();
        assert!(result.is_ok(), "{:?}", result.err());
    }

    let t = tab::get(&pool, tab_id).await.unwrap().unwrap();
    assert_eq!(t.items.len(), ADDS);
    assert_eq!(t.total, dec("15.00") * Decimal::from(ADDS as i64));
}

#[tokio::test]
async fn test_item_snapshot_survives_price_change() {
    let pool = pool().await;
    let m = menu(&pool).await;
    let t = open_tab(&pool, "Balcão").await;
    let item = add(&pool, t.id, m.beer, 1).await;
    assert_eq!(item.price, dec("15.00"));

    product::update(
        &pool,
        m.beer,
        product::ProductChanges {
            price_cents: Some(1800),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let t = tab::get(&pool, t.id).await.unwrap().unwrap();
    assert_eq!(t.items[0].price, dec("15.00"));
    assert_eq!(t.total, dec("15.00"));
}

#[tokio::test]
async fn test_item_overrides_and_validation() {
    let pool = pool().await;
    let m = menu(&pool).await;
    let t = open_tab(&pool, "Balcão").await;

    let custom = add_item(
        &pool,
        t.id,
        TabItemCreate {
            product_id: Some(m.beer),
            name: Some("Cerveja (promo)".into()),
            price: Some(dec("7.5")),
            quantity: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(custom.item.name, "Cerveja (promo)");
    assert_eq!(custom.item.quantity, 1);
    assert_eq!(custom.tab.total, dec("7.50"));

    for (payload, code) in [
        (
            TabItemCreate {
                product_id: None,
                ..Default::default()
            },
            ErrorCode::RequiredField,
        ),
        (
            TabItemCreate {
                product_id: Some(m.beer),
                quantity: Some(0),
                ..Default::default()
            },
            ErrorCode::ValidationFailed,
        ),
        (
            TabItemCreate {
                product_id: Some(m.beer),
                price: Some(dec("-1")),
                ..Default::default()
            },
            ErrorCode::ValidationFailed,
        ),
        (
            TabItemCreate {
                product_id: Some(404),
                ..Default::default()
            },
            ErrorCode::ProductNotFound,
        ),
    ] {
        let err = add_item(&pool, t.id, payload).await.unwrap_err();
        assert_eq!(err.code, code);
    }

    let err = remove_item(&pool, t.id, 9999).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TabItemNotFound);
    let err = add_item(
        &pool,
        777,
        TabItemCreate {
            product_id: Some(m.beer),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::TabNotFound);
}

#[tokio::test]
async fn test_items_frozen_once_closed() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;
    update_tab(&pool, &operator(), t.id, status(TabStatus::Closed))
        .await
        .unwrap();

    let err = add_item(
        &pool,
        t.id,
        TabItemCreate {
            product_id: t.items[0].product_id,
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::TabNotOpen);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);

    let err = remove_item(&pool, t.id, t.items[0].id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TabNotOpen);

    let after = tab::get(&pool, t.id).await.unwrap().unwrap();
    assert_eq!(after.total, dec("55.00"));
    assert_eq!(after.items.len(), 2);
}

// ========================================================================
// Transitions
// ========================================================================

#[tokio::test]
async fn test_pay_records_change() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;

    let err = update_tab(
        &pool,
        &operator(),
        t.id,
        TabUpdate {
            status: Some(TabStatus::Paid),
            amount_paid: Some(dec("50")),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentInsufficient);
    assert_eq!(
        tab::get(&pool, t.id).await.unwrap().unwrap().status,
        TabStatus::Open
    );

    let outcome = update_tab(
        &pool,
        &operator(),
        t.id,
        TabUpdate {
            status: Some(TabStatus::Paid),
            amount_paid: Some(dec("60")),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome.transition, Some(Transition::Pay));
    let paid = outcome.tab;
    assert_eq!(paid.status, TabStatus::Paid);
    assert_eq!(paid.amount_paid, Some(dec("60.00")));
    assert_eq!(paid.change, Some(dec("5.00")));
    assert_eq!(paid.payment_method.as_deref(), Some(PAYMENT_METHOD_CASH));
    assert!(paid.closed_at.is_some());
}

#[tokio::test]
async fn test_fiado_close_appends_ledger_entry() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;
    let c = new_client(&pool).await;

    let outcome = update_tab(
        &pool,
        &operator(),
        t.id,
        TabUpdate {
            status: Some(TabStatus::Closed),
            payment_method: Some("fiado".into()),
            client_id: Some(c),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome.transition, Some(Transition::Fiado));
    assert_eq!(outcome.tab.status, TabStatus::Fiado);
    assert_eq!(outcome.tab.client_id, Some(c));
    assert_eq!(outcome.tab.client_name.as_deref(), Some("Seu Zé"));

    let statement = ledger::client_statement(&pool, c).await.unwrap();
    assert_eq!(statement.balance, dec("55.00"));
    let entry = &statement.entries[0].transaction;
    assert_eq!(entry.kind, TransactionType::Fiado);
    assert_eq!(entry.tab_id, Some(t.id));
    assert_eq!(entry.description, "Fiado - Mesa 4");
}

#[tokio::test]
async fn test_fiado_failures_change_nothing() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;

    let err = update_tab(&pool, &operator(), t.id, status(TabStatus::Fiado))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);

    let c = new_client(&pool).await;
    let empty = open_tab(&pool, "Vazia").await;
    let err = update_tab(
        &pool,
        &operator(),
        empty.id,
        TabUpdate {
            status: Some(TabStatus::Fiado),
            client_id: Some(c),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::TabEmpty);

    // rolled back: no client binding, still open, no ledger rows
    let empty = tab::get(&pool, empty.id).await.unwrap().unwrap();
    assert_eq!(empty.status, TabStatus::Open);
    assert_eq!(empty.client_id, None);
    assert!(ledger::client_statement(&pool, c).await.unwrap().entries.is_empty());
}

#[tokio::test]
async fn test_disallowed_transition_is_conflict() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;
    update_tab(
        &pool,
        &operator(),
        t.id,
        TabUpdate {
            status: Some(TabStatus::Paid),
            amount_paid: Some(dec("55")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let c = new_client(&pool).await;
    let err = update_tab(
        &pool,
        &operator(),
        t.id,
        TabUpdate {
            status: Some(TabStatus::Fiado),
            client_id: Some(c),
            customer: Some("Renamed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);

    let after = tab::get(&pool, t.id).await.unwrap().unwrap();
    assert_eq!(after.status, TabStatus::Paid);
    assert_eq!(after.customer, "Mesa 4");
    assert_eq!(after.client_id, None);
}

#[tokio::test]
async fn test_reopen_is_admin_only_and_keeps_ledger() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;
    let c = new_client(&pool).await;
    let fiado = TabUpdate {
        status: Some(TabStatus::Fiado),
        client_id: Some(c),
        ..Default::default()
    };
    update_tab(&pool, &operator(), t.id, fiado.clone()).await.unwrap();

    let err = update_tab(&pool, &operator(), t.id, status(TabStatus::Open))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AdminRequired);
    assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);

    let reopened = update_tab(&pool, &admin(), t.id, status(TabStatus::Open))
        .await
        .unwrap();
    assert_eq!(reopened.transition, Some(Transition::Reopen));
    assert_eq!(reopened.tab.status, TabStatus::Open);
    assert!(reopened.tab.closed_at.is_none());
    assert!(reopened.tab.payment_method.is_none());
    assert_eq!(
        ledger::compute_client_balance(&pool, c).await.unwrap(),
        dec("55.00")
    );

    update_tab(&pool, &operator(), t.id, fiado).await.unwrap();
    let statement = ledger::client_statement(&pool, c).await.unwrap();
    assert_eq!(statement.entries.len(), 2);
    assert_eq!(statement.balance, dec("110.00"));
}

#[tokio::test]
async fn test_same_status_is_not_a_transition() {
    let pool = pool().await;
    let t = open_tab(&pool, "Mesa 1").await;
    let outcome = update_tab(
        &pool,
        &operator(),
        t.id,
        TabUpdate {
            status: Some(TabStatus::Open),
            customer: Some("Mesa 2".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome.transition, None);
    assert_eq!(outcome.tab.customer, "Mesa 2");
}

#[tokio::test]
async fn test_soft_delete() {
    let pool = pool().await;
    let t = tab_of_55(&pool).await;
    let deleted = delete_tab(&pool, &operator(), t.id).await.unwrap();
    assert_eq!(deleted.status, TabStatus::Deleted);
    assert!(deleted.deleted_at.is_some());
    assert_eq!(deleted.items.len(), 2);

    assert!(tab::find_all(&pool, &TabQuery::default()).await.unwrap().is_empty());
    let history = tab::find_history(&pool, &TabHistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(history[0].id, t.id);

    let err = delete_tab(&pool, &operator(), t.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
    let err = update_tab(&pool, &admin(), t.id, status(TabStatus::Open))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);

    let err = delete_tab(&pool, &operator(), 12345).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TabNotFound);
}
