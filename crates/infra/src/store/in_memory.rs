use std::sync::{Arc, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_cart::{Cart, CartLine, CartRecord, LineItem, LineItemKey};
use storefront_core::{CartId, Entity, ProductId};
use storefront_products::{Product, ProductFilter, ProductQuery};

use super::{Store, StoreError, StoreResult, StoreTransaction};

/// Rows of one entity kind, kept in insertion order.
#[derive(Debug, Clone)]
struct Table<E> {
    rows: Vec<E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<E: Entity> Table<E> {
    /// Linear scan.
    fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.iter().find(|row| row.id() == id)
    }

    fn contains(&self, id: E::Id) -> bool {
        self.get(id).is_some()
    }

    /// Returns `false` (and stores nothing) if the id is taken.
    fn insert(&mut self, row: E) -> bool {
        if self.contains(row.id()) {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Returns `false` if there was no row to replace.
    fn replace(&mut self, row: E) -> bool {
        match self.rows.iter_mut().find(|r| r.id() == row.id()) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: E::Id) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id() != id);
        before != self.rows.len()
    }

    fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    products: Table<Product>,
    carts: Table<CartRecord>,
    line_items: Table<LineItem>,
}

impl Tables {
    fn apply(&mut self, write: &Write) -> StoreResult<()> {
        match write {
            Write::InsertCart(cart) => {
                if !self.carts.insert(cart.clone()) {
                    return Err(StoreError::UniqueViolation(format!("cart {} already exists", cart.id)));
                }
            }
            Write::InsertLineItem(item) => {
                self.check_references(item)?;
                if !self.line_items.insert(*item) {
                    return Err(StoreError::UniqueViolation(format!(
                        "line item for product {} already exists in cart {}",
                        item.product_id, item.cart_id
                    )));
                }
            }
            Write::UpdateLineItem(item) => {
                // Zero affected rows is not an error, same as an UPDATE statement.
                self.line_items.replace(*item);
            }
            Write::DeleteLineItem(key) => {
                self.line_items.remove(*key);
            }
            Write::TouchCart { cart_id, at } => {
                if let Some(mut cart) = self.carts.get(*cart_id).cloned() {
                    cart.updated_at = *at;
                    self.carts.replace(cart);
                }
            }
        }
        Ok(())
    }

    fn check_references(&self, item: &LineItem) -> StoreResult<()> {
        if !self.carts.contains(item.cart_id) {
            return Err(StoreError::ForeignKeyViolation(format!("cart {} does not exist", item.cart_id)));
        }
        if !self.products.contains(item.product_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "product {} does not exist",
                item.product_id
            )));
        }
        Ok(())
    }
}

/// In-memory store.
///
/// Intended for tests/dev. Not optimized for performance: rows sit in
/// insertion-ordered vectors and every lookup by id is a linear scan, so
/// `cart_by_id` costs O(lines x products). Each commit also clones all tables,
/// applies the staged writes and swaps the result in; that clone dominates the
/// `cart_merge` bench numbers for this backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        read_tables(&self.tables)
    }
}

fn read_tables(tables: &RwLock<Tables>) -> StoreResult<RwLockReadGuard<'_, Tables>> {
    tables
        .read()
        .map_err(|_| StoreError::backend("read", "lock poisoned"))
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            tables: Arc::clone(&self.tables),
            writes: Vec::new(),
        }))
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("insert_product", "lock poisoned"))?;
        if !tables.products.insert(product.clone()) {
            return Err(StoreError::UniqueViolation(format!("product {} already exists", product.id)));
        }
        Ok(())
    }

    async fn product_by_id(&self, id: ProductId) -> StoreResult<Product> {
        self.read()?
            .products
            .get(id)
            .cloned()
            .ok_or(StoreError::not_found("product"))
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("update_product", "lock poisoned"))?;
        if !tables.products.replace(product.clone()) {
            return Err(StoreError::not_found("product"));
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("delete_product", "lock poisoned"))?;
        if tables.products.remove(id) {
            tables.line_items.rows.retain(|item| item.product_id != id);
        }
        Ok(())
    }

    async fn query_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let tables = self.read()?;
        let mut matching: Vec<Product> = tables
            .products
            .iter()
            .filter(|p| query.filter.matches(p))
            .cloned()
            .collect();
        drop(tables);

        if let Some(order) = query.order {
            matching.sort_by(|a, b| order.compare(a, b));
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_products(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let tables = self.read()?;
        Ok(tables.products.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn cart_by_id(&self, id: CartId) -> StoreResult<Cart> {
        let tables = self.read()?;
        let record = tables.carts.get(id).ok_or(StoreError::not_found("cart"))?;

        let items = tables
            .line_items
            .iter()
            .filter(|item| item.cart_id == id)
            .filter_map(|item| {
                tables.products.get(item.product_id).map(|product| CartLine {
                    product: product.clone(),
                    count: item.count,
                })
            })
            .collect();

        Ok(Cart {
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            items,
        })
    }
}

#[derive(Debug, Clone)]
enum Write {
    InsertCart(CartRecord),
    InsertLineItem(LineItem),
    UpdateLineItem(LineItem),
    DeleteLineItem(LineItemKey),
    TouchCart { cart_id: CartId, at: DateTime<Utc> },
}

/// Staged writes against an [`InMemoryStore`].
///
/// Reads see committed rows overlaid with this transaction's own writes.
/// Constraints are checked eagerly and once more when committing.
#[derive(Debug)]
pub struct InMemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    writes: Vec<Write>,
}

impl InMemoryTransaction {
    fn visible_line_item(&self, key: LineItemKey) -> StoreResult<Option<LineItem>> {
        for write in self.writes.iter().rev() {
            match write {
                Write::InsertLineItem(item) | Write::UpdateLineItem(item) if item.key() == key => {
                    return Ok(Some(*item));
                }
                Write::DeleteLineItem(deleted) if *deleted == key => return Ok(None),
                _ => {}
            }
        }
        Ok(read_tables(&self.tables)?.line_items.get(key).copied())
    }

    fn cart_visible(&self, tables: &Tables, id: CartId) -> bool {
        tables.carts.contains(id)
            || self
                .writes
                .iter()
                .any(|w| matches!(w, Write::InsertCart(cart) if cart.id == id))
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_cart(&mut self, cart: &CartRecord) -> StoreResult<()> {
        let exists = {
            let tables = read_tables(&self.tables)?;
            self.cart_visible(&tables, cart.id)
        };
        if exists {
            return Err(StoreError::UniqueViolation(format!("cart {} already exists", cart.id)));
        }
        self.writes.push(Write::InsertCart(cart.clone()));
        Ok(())
    }

    async fn line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<LineItem> {
        self.visible_line_item(LineItemKey { cart_id, product_id })?
            .ok_or(StoreError::not_found("line item"))
    }

    async fn insert_line_item(&mut self, item: &LineItem) -> StoreResult<()> {
        {
            let tables = read_tables(&self.tables)?;
            if !self.cart_visible(&tables, item.cart_id) {
                return Err(StoreError::ForeignKeyViolation(format!("cart {} does not exist", item.cart_id)));
            }
            if !tables.products.contains(item.product_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "product {} does not exist",
                    item.product_id
                )));
            }
        }
        if self.visible_line_item(item.key())?.is_some() {
            return Err(StoreError::UniqueViolation(format!(
                "line item for product {} already exists in cart {}",
                item.product_id, item.cart_id
            )));
        }
        self.writes.push(Write::InsertLineItem(*item));
        Ok(())
    }

    async fn update_line_item(&mut self, item: &LineItem) -> StoreResult<()> {
        self.writes.push(Write::UpdateLineItem(*item));
        Ok(())
    }

    async fn delete_line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<u64> {
        let key = LineItemKey { cart_id, product_id };
        let existed = self.visible_line_item(key)?.is_some();
        self.writes.push(Write::DeleteLineItem(key));
        Ok(u64::from(existed))
    }

    async fn touch_cart(&mut self, cart_id: CartId, at: DateTime<Utc>) -> StoreResult<u64> {
        let visible = {
            let tables = read_tables(&self.tables)?;
            self.cart_visible(&tables, cart_id)
        };
        self.writes.push(Write::TouchCart { cart_id, at });
        Ok(u64::from(visible))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.writes.is_empty() {
            return Ok(());
        }
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::backend("commit", "lock poisoned"))?;

        let mut next = tables.clone();
        for write in &self.writes {
            next.apply(write)?;
        }
        *tables = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
