//! Integration tests for the storefront operations over the in-memory store.
//!
//! Verifies:
//! - Line item merges accumulate and batches are all-or-nothing
//! - Listing totals ignore pagination
//! - Product edits are validated as a whole before anything is saved
//! - Store failures are classified into NotFound / Internal

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};

    use storefront_cart::{Cart, CartItem, CartRecord, LineItem};
    use storefront_core::{CartId, ErrorKind, ProductId};
    use storefront_products::{ListProducts, NewProduct, Product, ProductFilter, ProductQuery};

    use crate::services::Storefront;
    use crate::store::{InMemoryStore, Store, StoreError, StoreResult, StoreTransaction};
    use crate::updater::ProductFieldUpdater;

    fn new_product(name: &str, price: f64) -> NewProduct {
        NewProduct {
            code: format!("C-{name}"),
            name: name.to_string(),
            price,
            image_url: format!("http://img/{name}"),
        }
    }

    fn listing(page: i64, page_size: i64) -> ListProducts {
        ListProducts {
            page,
            page_size,
            search_term: String::new(),
            order_by: "price".to_string(),
            ascending: true,
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn count_of(cart: &Cart, product_id: ProductId) -> Option<u32> {
        cart.line(product_id).map(|line| line.count)
    }

    #[tokio::test]
    async fn created_products_are_normalized_and_readable() {
        let storefront = Storefront::in_memory();
        let created = storefront
            .create_product(NewProduct {
                code: " A1 ".to_string(),
                name: " widget ".to_string(),
                price: 9.99,
                image_url: " u ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.name, "WIDGET");
        assert_eq!(created.code, "A1");
        assert_eq!(storefront.get_product(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let storefront = Storefront::in_memory();
        let err = storefront.get_product(ProductId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "the requested product does not exist");
    }

    #[tokio::test]
    async fn total_counts_every_match_while_items_hold_one_page() {
        let storefront = Storefront::in_memory();
        for i in 0..25 {
            storefront
                .create_product(new_product(&format!("item{i}"), f64::from(i)))
                .await
                .unwrap();
        }

        let page = storefront.list_products(listing(3, 10)).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].price, 20.0);

        let beyond = storefront.list_products(listing(4, 10)).await.unwrap();
        assert_eq!(beyond.total, 25);
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn last_page_is_full_when_total_is_a_multiple_of_the_page_size() {
        let storefront = Storefront::in_memory();
        for i in 0..20 {
            storefront
                .create_product(new_product(&format!("item{i}"), f64::from(i)))
                .await
                .unwrap();
        }

        let page = storefront.list_products(listing(2, 10)).await.unwrap();
        assert_eq!(page.total, 20);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].price, 10.0);
        assert_eq!(page.items[9].price, 19.0);

        let beyond = storefront.list_products(listing(3, 10)).await.unwrap();
        assert_eq!(beyond.total, 20);
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_filters_the_total() {
        let storefront = Storefront::in_memory();
        storefront.create_product(new_product("Blue Shirt", 10.0)).await.unwrap();
        storefront.create_product(new_product("Red Hat", 5.0)).await.unwrap();

        for term in ["blue", "SHIRT"] {
            let mut request = listing(1, 10);
            request.search_term = term.to_string();
            let page = storefront.list_products(request).await.unwrap();
            assert_eq!(page.total, 1, "term {term}");
            assert_eq!(page.items[0].name, "BLUE SHIRT");
        }
    }

    #[tokio::test]
    async fn descending_order_is_honored() {
        let storefront = Storefront::in_memory();
        for price in [3.0, 1.0, 2.0] {
            storefront
                .create_product(new_product(&format!("p{price}"), price))
                .await
                .unwrap();
        }

        let mut request = listing(1, 10);
        request.ascending = false;
        let prices: Vec<f64> = storefront
            .list_products(request)
            .await
            .unwrap()
            .items
            .iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, vec![3.0, 2.0, 1.0]);
    }

    #[tokio::test]
    async fn invalid_listing_requests_are_validation_errors() {
        let storefront = Storefront::in_memory();

        let err = storefront.list_products(listing(0, 10)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut request = listing(1, 10);
        request.order_by = "color".to_string();
        let err = storefront.list_products(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn zero_page_size_returns_no_items_but_the_total() {
        let storefront = Storefront::in_memory();
        storefront.create_product(new_product("a", 1.0)).await.unwrap();

        let page = storefront.list_products(listing(1, 0)).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn invalid_edit_set_changes_nothing() {
        let storefront = Storefront::in_memory();
        let product = storefront.create_product(new_product("widget", 9.99)).await.unwrap();

        let err = storefront
            .update_product(product.id, &fields(json!({ "name": "X", "price": "not-a-number" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "the value for the product price is invalid");

        let stored = storefront.get_product(product.id).await.unwrap();
        assert_eq!(stored.name, "WIDGET");
        assert_eq!(stored.price, 9.99);
    }

    #[tokio::test]
    async fn unknown_edit_field_is_a_validation_error() {
        let storefront = Storefront::in_memory();
        let product = storefront.create_product(new_product("widget", 1.0)).await.unwrap();

        let err = storefront
            .update_product(product.id, &fields(json!({ "color": "red" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn missing_product_wins_over_invalid_edits() {
        let storefront = Storefront::in_memory();
        let err = storefront
            .update_product(ProductId::new(), &fields(json!({ "color": "red" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn valid_edits_are_saved_and_reflected_in_the_entity() {
        let store = Arc::new(InMemoryStore::new());
        let storefront = Storefront::new(Arc::clone(&store));
        let updater = ProductFieldUpdater::new(Arc::clone(&store));
        let mut product = storefront.create_product(new_product("widget", 1.0)).await.unwrap();

        updater
            .apply(&mut product, &fields(json!({ "price": 12, "imageURL": "http://new" })))
            .await
            .unwrap();
        assert_eq!(product.price, 12.0);
        assert_eq!(product.image_url, "http://new");
        assert_eq!(product.name, "WIDGET");
        assert_eq!(storefront.get_product(product.id).await.unwrap(), product);

        let before = product.clone();
        updater
            .apply(&mut product, &fields(json!({ "code": 5 })))
            .await
            .unwrap_err();
        assert_eq!(product, before);
    }

    #[tokio::test]
    async fn repeated_adds_accumulate_into_one_line() {
        let storefront = Storefront::in_memory();
        let product = storefront.create_product(new_product("widget", 1.0)).await.unwrap();
        let cart = storefront.create_cart(&[]).await.unwrap();

        storefront
            .add_items_to_cart(cart.id, &[CartItem::new(product.id, 2)])
            .await
            .unwrap();
        storefront
            .add_items_to_cart(cart.id, &[CartItem::new(product.id, 3)])
            .await
            .unwrap();

        let cart = storefront.get_cart(cart.id).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(count_of(&cart, product.id), Some(5));
    }

    #[tokio::test]
    async fn duplicate_products_within_one_batch_merge() {
        let storefront = Storefront::in_memory();
        let product = storefront.create_product(new_product("widget", 1.0)).await.unwrap();

        let cart = storefront
            .create_cart(&[CartItem::new(product.id, 2), CartItem::new(product.id, 3)])
            .await
            .unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(count_of(&cart, product.id), Some(5));
    }

    #[tokio::test]
    async fn failing_batch_leaves_the_cart_untouched() {
        let storefront = Storefront::in_memory();
        let known = storefront.create_product(new_product("widget", 1.0)).await.unwrap();
        let cart = storefront
            .create_cart(&[CartItem::new(known.id, 1)])
            .await
            .unwrap();

        let err = storefront
            .add_items_to_cart(
                cart.id,
                &[CartItem::new(known.id, 4), CartItem::new(ProductId::new(), 1)],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), "failed to add items to the cart");

        let cart = storefront.get_cart(cart.id).await.unwrap();
        assert_eq!(count_of(&cart, known.id), Some(1));
    }

    #[tokio::test]
    async fn adding_to_an_absent_cart_is_internal() {
        let storefront = Storefront::in_memory();
        let product = storefront.create_product(new_product("widget", 1.0)).await.unwrap();
        let err = storefront
            .add_items_to_cart(CartId::new(), &[CartItem::new(product.id, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn overflowing_count_is_rejected_and_rolled_back() {
        let storefront = Storefront::in_memory();
        let a = storefront.create_product(new_product("a", 1.0)).await.unwrap();
        let b = storefront.create_product(new_product("b", 1.0)).await.unwrap();
        let cart = storefront
            .create_cart(&[CartItem::new(a.id, u32::MAX)])
            .await
            .unwrap();

        let err = storefront
            .add_items_to_cart(cart.id, &[CartItem::new(b.id, 1), CartItem::new(a.id, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let cart = storefront.get_cart(cart.id).await.unwrap();
        assert_eq!(count_of(&cart, a.id), Some(u32::MAX));
        assert_eq!(count_of(&cart, b.id), None);
    }

    #[tokio::test]
    async fn lookup_failure_mid_batch_rolls_back_earlier_items() {
        let inner = Arc::new(InMemoryStore::new());
        let setup = Storefront::new(Arc::clone(&inner));
        let a = setup.create_product(new_product("a", 1.0)).await.unwrap();
        let b = setup.create_product(new_product("b", 1.0)).await.unwrap();
        let cart = setup.create_cart(&[]).await.unwrap();

        // Second lookup of the batch fails.
        let storefront = Storefront::new(Arc::new(FailingLookups::new(inner, 1)));
        let err = storefront
            .add_items_to_cart(cart.id, &[CartItem::new(a.id, 1), CartItem::new(b.id, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.diagnostic().contains("injected lookup failure"));

        assert!(setup.get_cart(cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_items_skips_absent_products() {
        let storefront = Storefront::in_memory();
        let a = storefront.create_product(new_product("a", 1.0)).await.unwrap();
        let b = storefront.create_product(new_product("b", 1.0)).await.unwrap();
        let cart = storefront
            .create_cart(&[CartItem::new(a.id, 1), CartItem::new(b.id, 2)])
            .await
            .unwrap();

        storefront
            .remove_items_from_cart(cart.id, &[a.id, ProductId::new()])
            .await
            .unwrap();

        let cart = storefront.get_cart(cart.id).await.unwrap();
        assert_eq!(count_of(&cart, a.id), None);
        assert_eq!(count_of(&cart, b.id), Some(2));

        storefront
            .remove_items_from_cart(CartId::new(), &[b.id])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn item_batches_advance_the_cart_update_time() {
        let storefront = Storefront::in_memory();
        let product = storefront.create_product(new_product("widget", 1.0)).await.unwrap();
        let created = storefront.create_cart(&[]).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        storefront
            .add_items_to_cart(created.id, &[CartItem::new(product.id, 1)])
            .await
            .unwrap();
        let after_add = storefront.get_cart(created.id).await.unwrap();
        assert_eq!(after_add.created_at, created.created_at);
        assert!(after_add.updated_at > created.updated_at);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        storefront
            .remove_items_from_cart(created.id, &[product.id])
            .await
            .unwrap();
        let after_remove = storefront.get_cart(created.id).await.unwrap();
        assert!(after_remove.updated_at > after_add.updated_at);
    }

    #[tokio::test]
    async fn failed_batch_leaves_the_cart_update_time_alone() {
        let storefront = Storefront::in_memory();
        let created = storefront.create_cart(&[]).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        storefront
            .add_items_to_cart(created.id, &[CartItem::new(ProductId::new(), 1)])
            .await
            .unwrap_err();

        let cart = storefront.get_cart(created.id).await.unwrap();
        assert_eq!(cart.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn deleting_a_product_removes_it_from_carts() {
        let storefront = Storefront::in_memory();
        let product = storefront.create_product(new_product("widget", 1.0)).await.unwrap();
        let cart = storefront
            .create_cart(&[CartItem::new(product.id, 3)])
            .await
            .unwrap();

        storefront.delete_product(product.id).await.unwrap();
        storefront.delete_product(product.id).await.unwrap();

        assert!(storefront.get_cart(cart.id).await.unwrap().is_empty());
        let err = storefront.get_product(product.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn missing_cart_is_not_found() {
        let storefront = Storefront::in_memory();
        let err = storefront.get_cart(CartId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "the requested cart does not exist");
    }

    #[tokio::test]
    async fn widget_cart_scenario() {
        let storefront = Storefront::in_memory();
        let widget = storefront
            .create_product(NewProduct {
                code: "A1".to_string(),
                name: "widget".to_string(),
                price: 9.99,
                image_url: "u".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(widget.name, "WIDGET");

        let cart = storefront
            .create_cart(&[CartItem::new(widget.id, 2)])
            .await
            .unwrap();
        assert_eq!(count_of(&cart, widget.id), Some(2));

        storefront
            .add_items_to_cart(cart.id, &[CartItem::new(widget.id, 3)])
            .await
            .unwrap();
        let cart = storefront.get_cart(cart.id).await.unwrap();
        assert_eq!(count_of(&cart, widget.id), Some(5));
        assert!((cart.subtotal() - 49.95).abs() < 1e-9);

        storefront
            .remove_items_from_cart(cart.id, &[widget.id])
            .await
            .unwrap();
        assert!(storefront.get_cart(cart.id).await.unwrap().is_empty());
    }

    /// Two batches that read the same line item before either commits: the
    /// second commit overwrites the first increment. Lookups take no row lock.
    ///
    /// Replays the lookup, merge and update steps of `merge_items` by hand on
    /// two transactions to force this interleaving; `add_items` itself is not
    /// called here.
    #[tokio::test]
    async fn interleaved_batches_can_lose_an_increment() {
        let store = InMemoryStore::new();
        let product = Product::create(ProductId::new(), new_product("widget", 1.0), chrono::Utc::now());
        store.insert_product(&product).await.unwrap();

        let cart = CartRecord::new(CartId::new(), chrono::Utc::now());
        let mut setup = store.begin().await.unwrap();
        setup.insert_cart(&cart).await.unwrap();
        setup
            .insert_line_item(&LineItem::new(cart.id, CartItem::new(product.id, 2)))
            .await
            .unwrap();
        setup.commit().await.unwrap();

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        let seen_by_first = first.line_item(cart.id, product.id).await.unwrap();
        let seen_by_second = second.line_item(cart.id, product.id).await.unwrap();

        first
            .update_line_item(&seen_by_first.merged(3).unwrap())
            .await
            .unwrap();
        first.commit().await.unwrap();
        second
            .update_line_item(&seen_by_second.merged(2).unwrap())
            .await
            .unwrap();
        second.commit().await.unwrap();

        let cart = store.cart_by_id(cart.id).await.unwrap();
        assert_eq!(count_of(&cart, product.id), Some(4));
    }

    proptest::proptest! {
        #[test]
        fn sequential_adds_sum_per_product(batches in proptest::collection::vec(
            proptest::collection::vec((0usize..3, 1u32..50), 0..6),
            1..6,
        )) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let storefront = Storefront::in_memory();
                let mut products = Vec::new();
                for name in ["a", "b", "c"] {
                    products.push(storefront.create_product(new_product(name, 1.0)).await.unwrap());
                }
                let cart = storefront.create_cart(&[]).await.unwrap();

                let mut expected = [0u32; 3];
                for batch in &batches {
                    let items: Vec<CartItem> = batch
                        .iter()
                        .map(|&(idx, count)| {
                            expected[idx] += count;
                            CartItem::new(products[idx].id, count)
                        })
                        .collect();
                    storefront.add_items_to_cart(cart.id, &items).await.unwrap();
                }

                let cart = storefront.get_cart(cart.id).await.unwrap();
                for (idx, product) in products.iter().enumerate() {
                    let want = (expected[idx] > 0).then_some(expected[idx]);
                    assert_eq!(count_of(&cart, product.id), want);
                }
            });
        }
    }

    /// Delegates to an [`InMemoryStore`] but fails line item lookups once
    /// `allowed` of them have succeeded.
    struct FailingLookups {
        inner: Arc<InMemoryStore>,
        allowed: usize,
    }

    impl FailingLookups {
        fn new(inner: Arc<InMemoryStore>, allowed: usize) -> Self {
            Self { inner, allowed }
        }
    }

    #[async_trait]
    impl Store for FailingLookups {
        async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
            Ok(Box::new(FailingTransaction {
                inner: self.inner.begin().await?,
                remaining: self.allowed,
            }))
        }

        async fn insert_product(&self, product: &Product) -> StoreResult<()> {
            self.inner.insert_product(product).await
        }

        async fn product_by_id(&self, id: ProductId) -> StoreResult<Product> {
            self.inner.product_by_id(id).await
        }

        async fn update_product(&self, product: &Product) -> StoreResult<()> {
            self.inner.update_product(product).await
        }

        async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
            self.inner.delete_product(id).await
        }

        async fn query_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
            self.inner.query_products(query).await
        }

        async fn count_products(&self, filter: &ProductFilter) -> StoreResult<u64> {
            self.inner.count_products(filter).await
        }

        async fn cart_by_id(&self, id: CartId) -> StoreResult<Cart> {
            self.inner.cart_by_id(id).await
        }
    }

    struct FailingTransaction {
        inner: Box<dyn StoreTransaction>,
        remaining: usize,
    }

    #[async_trait]
    impl StoreTransaction for FailingTransaction {
        async fn insert_cart(&mut self, cart: &CartRecord) -> StoreResult<()> {
            self.inner.insert_cart(cart).await
        }

        async fn line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<LineItem> {
            if self.remaining == 0 {
                return Err(StoreError::backend("line_item", "injected lookup failure"));
            }
            self.remaining -= 1;
            self.inner.line_item(cart_id, product_id).await
        }

        async fn insert_line_item(&mut self, item: &LineItem) -> StoreResult<()> {
            self.inner.insert_line_item(item).await
        }

        async fn update_line_item(&mut self, item: &LineItem) -> StoreResult<()> {
            self.inner.update_line_item(item).await
        }

        async fn delete_line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<u64> {
            self.inner.delete_line_item(cart_id, product_id).await
        }

        async fn touch_cart(&mut self, cart_id: CartId, at: chrono::DateTime<chrono::Utc>) -> StoreResult<u64> {
            self.inner.touch_cart(cart_id, at).await
        }

        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.inner.commit().await
        }

        async fn rollback(self: Box<Self>) -> StoreResult<()> {
            self.inner.rollback().await
        }
    }
}
