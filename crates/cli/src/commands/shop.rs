//! Catalog browsing and shop filters.

use clap::Subcommand;
use rust_decimal::Decimal;
use zone7_core::ProductId;
use zone7_core::filters::{FilterAction, FilterSection};
use zone7_storefront::services::{apply_filter_action, load_filters};

use crate::context::{CliError, Context};
use crate::output::print_json;

/// Changes to the saved shop filters.
#[derive(Debug, Subcommand)]
pub enum FilterCommand {
    /// Toggle a category
    Category { name: String },
    /// Toggle a subcategory
    Subcategory { name: String },
    /// Set the price range
    Price { min: Decimal, max: Decimal },
    /// Only show products in stock
    InStock {
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Go to a page
    Page { page: usize },
    /// Reset one section (`price`, `categories`, `stock`)
    Reset { section: FilterSection },
    /// Reset every filter
    ResetAll,
}

impl From<FilterCommand> for FilterAction {
    fn from(command: FilterCommand) -> Self {
        match command {
            FilterCommand::Category { name } => Self::ToggleCategory { name },
            FilterCommand::Subcategory { name } => Self::ToggleSubcategory { name },
            FilterCommand::Price { min, max } => Self::SetPriceRange { min, max },
            FilterCommand::InStock { value } => Self::SetInStockOnly { value },
            FilterCommand::Page { page } => Self::Paginate { page },
            FilterCommand::Reset { section } => Self::ResetFilter { section },
            FilterCommand::ResetAll => Self::ResetAll,
        }
    }
}

/// Show the shop page for the saved filters.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn list(ctx: &Context, page: Option<usize>) -> Result<(), CliError> {
    let filters = match page {
        Some(page) => apply_filter_action(&ctx.store, &FilterAction::Paginate { page }).await?,
        None => load_filters(&ctx.store).await?,
    };
    print_json(&ctx.catalog.shop(filters).await?)?;
    Ok(())
}

/// Change the saved filters and show them.
///
/// # Errors
///
/// Returns an error if the state file cannot be written.
pub async fn filter(ctx: &Context, command: FilterCommand) -> Result<(), CliError> {
    let filters = apply_filter_action(&ctx.store, &command.into()).await?;
    print_json(&filters)?;
    Ok(())
}

/// Show one product with related products.
///
/// # Errors
///
/// Returns a CMS error, including not found.
pub async fn show(ctx: &Context, id: i64) -> Result<(), CliError> {
    print_json(&ctx.catalog.detail(ProductId::new(id)).await?)?;
    Ok(())
}

/// Search products by name.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn search(ctx: &Context, term: &str) -> Result<(), CliError> {
    print_json(&ctx.catalog.search(term).await?)?;
    Ok(())
}

/// Categories with product counts.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn categories(ctx: &Context) -> Result<(), CliError> {
    print_json(&ctx.catalog.categories().await?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_command_maps_to_action() {
        assert_eq!(
            FilterAction::from(FilterCommand::Price {
                min: Decimal::new(995, 1),
                max: Decimal::new(900, 0)
            }),
            FilterAction::SetPriceRange {
                min: Decimal::new(995, 1),
                max: Decimal::new(900, 0)
            }
        );
        assert_eq!(
            FilterAction::from(FilterCommand::Reset {
                section: FilterSection::Stock
            }),
            FilterAction::ResetFilter {
                section: FilterSection::Stock
            }
        );
    }
}
