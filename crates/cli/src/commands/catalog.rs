use serde_json::json;
use trekdesk_core::config::LoadOptions;
use trekdesk_core::{CatalogApi, PackageId, PackageQuery};

use crate::commands::{api_client, block_on, currency_formatter, load_config, CommandResult};
use crate::PackagesArgs;

pub fn list(options: &LoadOptions, args: &PackagesArgs) -> CommandResult {
    let query = PackageQuery {
        search: args.search.clone(),
        category: args.category.clone(),
        price_min: args.price_min,
        price_max: args.price_max,
        duration: args.duration,
        sort: args.sort,
        page: args.page,
        limit: args.limit,
    };

    block_on("packages", list_packages(options, query))
}

async fn list_packages(
    options: &LoadOptions,
    query: PackageQuery,
) -> Result<CommandResult, CommandResult> {
    let config = load_config("packages", options)?;
    let formatter = currency_formatter("packages", &config)?;
    let api = api_client("packages", &config)?;

    let page = api
        .list_packages(&query)
        .await
        .map_err(|error| CommandResult::api_failure("packages", &error))?;

    let display = config.currency.display;
    let packages: Vec<_> = page
        .data
        .iter()
        .map(|package| {
            json!({
                "id": package.id,
                "slug": package.lookup_key(),
                "name": package.name,
                "duration": package.duration,
                "category": package.category,
                "price": formatter.format_converted(package.price, display),
            })
        })
        .collect();
    let message = format!(
        "page {} of {} ({} packages in total)",
        query.page(),
        page.pagination.total_pages,
        page.pagination.total_items
    );

    Ok(CommandResult::success_with(
        "packages",
        message,
        Some(json!({ "packages": packages, "pagination": page.pagination })),
    ))
}

pub fn show(options: &LoadOptions, id: &str) -> CommandResult {
    block_on("package", show_package(options, id))
}

async fn show_package(options: &LoadOptions, id: &str) -> Result<CommandResult, CommandResult> {
    let config = load_config("package", options)?;
    let formatter = currency_formatter("package", &config)?;
    let api = api_client("package", &config)?;

    let package = api
        .get_package(&PackageId(id.trim().to_string()))
        .await
        .map_err(|error| CommandResult::api_failure("package", &error))?;

    let message = format!("{} ({}, {})", package.name, package.duration, package.location);
    Ok(CommandResult::success_with(
        "package",
        message,
        Some(json!({
            "package": package,
            "prices": formatter.format_all(package.price),
        })),
    ))
}
