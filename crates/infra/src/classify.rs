//! Translation of raw storage failures into caller-facing errors.

use storefront_core::{BoxError, CoreError, CoreResult};

use crate::store::StoreError;

/// Store operation a failure happened in; selects the caller-facing message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListProducts,
    CountProducts,
    GetProduct,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    CreateCart,
    GetCart,
    AddItems,
    RemoveItems,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOperation::ListProducts => "list_products",
            StoreOperation::CountProducts => "count_products",
            StoreOperation::GetProduct => "get_product",
            StoreOperation::CreateProduct => "create_product",
            StoreOperation::UpdateProduct => "update_product",
            StoreOperation::DeleteProduct => "delete_product",
            StoreOperation::CreateCart => "create_cart",
            StoreOperation::GetCart => "get_cart",
            StoreOperation::AddItems => "add_items",
            StoreOperation::RemoveItems => "remove_items",
        }
    }

    pub fn not_found_message(self) -> &'static str {
        match self {
            StoreOperation::GetProduct => "the requested product does not exist",
            StoreOperation::UpdateProduct => "the product to update does not exist",
            StoreOperation::GetCart => "the requested cart does not exist",
            _ => "the requested record does not exist",
        }
    }

    pub fn internal_message(self) -> &'static str {
        match self {
            StoreOperation::ListProducts | StoreOperation::CountProducts => {
                "failed to list products"
            }
            StoreOperation::GetProduct => "failed to retrieve the product",
            StoreOperation::CreateProduct => "failed to create the product",
            StoreOperation::UpdateProduct => "failed to update the product",
            StoreOperation::DeleteProduct => "failed to delete the product",
            StoreOperation::CreateCart => "failed to create the cart",
            StoreOperation::GetCart => "failed to retrieve the cart",
            StoreOperation::AddItems => "failed to add items to the cart",
            StoreOperation::RemoveItems => "failed to remove items from the cart",
        }
    }
}

impl core::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps any failure to a [`CoreError`]:
/// - an error that already is a [`CoreError`] passes through unchanged
/// - [`StoreError::NotFound`] becomes `NotFound`
/// - everything else becomes `Internal`
///
/// The original error is kept as the cause.
#[derive(Debug, Copy, Clone, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(operation: StoreOperation, err: impl Into<BoxError>) -> CoreError {
        let err: BoxError = err.into();
        let err = match err.downcast::<CoreError>() {
            Ok(core) => return *core,
            Err(err) => err,
        };

        let not_found = err
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_not_found);
        if not_found {
            CoreError::not_found(operation.not_found_message(), err)
        } else {
            CoreError::internal(operation.internal_message(), err)
        }
    }
}

/// `result.classify(op)` shorthand for [`ErrorClassifier::classify`].
pub trait ClassifyExt<T> {
    fn classify(self, operation: StoreOperation) -> CoreResult<T>;
}

impl<T, E: Into<BoxError>> ClassifyExt<T> for Result<T, E> {
    fn classify(self, operation: StoreOperation) -> CoreResult<T> {
        self.map_err(|err| ErrorClassifier::classify(operation, err))
    }
}
