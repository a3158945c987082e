//! Catalog command handlers.

use std::sync::Arc;

use anyhow::Result;
use comfy_table::{ContentArrangement, Table};
use weda_core::api::ApiClient;
use weda_core::catalog::{CategoriesClient, PageQuery, ProductsClient};

pub async fn products_list(api: &Arc<ApiClient>, query: &PageQuery) -> Result<()> {
    let client = ProductsClient::new(Arc::clone(api));
    let response = client.list(query).await?;

    if response.result.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Item", "Price", "Unit", "Category"]);
    for product in response.result {
        table.add_row(vec![
            product.product_id.to_string(),
            product.item,
            product
                .unit_price
                .map_or_else(String::new, |price| format!("{price:.2}")),
            product.unit,
            product.category_id.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn products_show(api: &Arc<ApiClient>, id: i64) -> Result<()> {
    let product = ProductsClient::new(Arc::clone(api)).get(id).await?;

    println!("ID:          {}", product.product_id);
    println!("Item:        {}", product.item);
    if let Some(description) = product.description.as_deref() {
        println!("Description: {description}");
    }
    if let Some(price) = product.unit_price {
        println!("Price:       {price:.2}");
    }
    if let Some(discount) = product.discount {
        println!("Discount:    {discount:.2}");
    }
    if let Some(qty) = product.qty {
        println!("In stock:    {qty}");
    }
    println!("Unit:        {}", product.unit);
    println!("Category:    {}", product.category_id);
    Ok(())
}

pub async fn categories_list(api: &Arc<ApiClient>, query: &PageQuery) -> Result<()> {
    let client = CategoriesClient::new(Arc::clone(api));
    let response = client.list(query).await?;

    if response.result.is_empty() {
        println!("No categories found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Description"]);
    for category in response.result {
        table.add_row(vec![
            category.category_id.to_string(),
            category.category_name,
            category.category_description.unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn categories_show(api: &Arc<ApiClient>, id: i64) -> Result<()> {
    let category = CategoriesClient::new(Arc::clone(api)).get(id).await?;

    println!("ID:          {}", category.category_id);
    println!("Name:        {}", category.category_name);
    if let Some(description) = category.category_description.as_deref() {
        println!("Description: {description}");
    }
    Ok(())
}
