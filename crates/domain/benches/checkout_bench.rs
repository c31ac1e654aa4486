use common::{Category, Money, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CartService, CheckoutService, PlaceOrder};
use store::{InMemoryStore, Product, ProductDraft, Store};

fn seed_product(rt: &tokio::runtime::Runtime, store: &InMemoryStore, stock: u32) -> Product {
    let product = Product::from_draft(ProductDraft {
        name: "Benchmark Widget".to_string(),
        description: None,
        price: Money::from_cents(1000),
        stock_quantity: stock,
        category: Category::Watch,
        brand: None,
        image_url: None,
    });
    rt.block_on(store.insert_product(&product)).unwrap();
    product
}

fn place_order_request() -> PlaceOrder {
    PlaceOrder {
        shipping_address: "1 Bench Lane".to_string(),
        payment_method: "CARD".to_string(),
    }
}

fn bench_add_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = seed_product(&rt, &store, u32::MAX);
    let carts = CartService::new(store);
    let user = UserId::new();

    c.bench_function("cart/add_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                carts.add_item(user, product.id, 1).await.unwrap();
            });
        });
    });
}

fn bench_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = seed_product(&rt, &store, u32::MAX);
    let carts = CartService::new(store.clone());
    let checkout = CheckoutService::new(store);

    c.bench_function("checkout/add_and_place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let user = UserId::new();
                carts.add_item(user, product.id, 2).await.unwrap();
                checkout
                    .place_order(user, place_order_request())
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_add_item, bench_checkout);
criterion_main!(benches);
