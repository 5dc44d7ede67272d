//! One-shot client commands (ls, show, create, delete, gen-key, rename)

use crate::api::ApiClient;
use crate::config::Settings;
use crate::render::{display_key, print_table, render};
use anyhow::{Context, Result};
use console::style;
use keydesk_common::{Client, ClientId};

fn api(settings: &Settings) -> Result<ApiClient> {
    ApiClient::new(&settings.api).context("Failed to build HTTP client")
}

/// List all clients
pub async fn list(settings: &Settings) -> Result<()> {
    let api = api(settings)?;
    let clients = api
        .list_clients()
        .await
        .with_context(|| format!("Failed to list clients from {}", api.base_url()))?;

    print_table(&render(&clients));
    Ok(())
}

/// Show one client
pub async fn show(settings: &Settings, id: ClientId) -> Result<()> {
    let client = api(settings)?
        .get_client(id)
        .await
        .with_context(|| format!("Failed to fetch client {}", id))?;

    print_client(&client);
    Ok(())
}

/// Create a client
pub async fn create(settings: &Settings, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Client name must not be empty");
    }

    let api = api(settings)?;
    let client = api
        .create_client(name)
        .await
        .with_context(|| format!("Failed to create client '{}'", name))?;

    println!("{} client {}", style("Created").green().bold(), style(client.id).cyan());
    print_client(&client);
    refresh(&api).await
}

/// Delete a client
pub async fn delete(settings: &Settings, id: ClientId) -> Result<()> {
    let api = api(settings)?;
    let removed = api
        .delete_client(id)
        .await
        .with_context(|| format!("Failed to delete client {}", id))?;

    println!(
        "{} client {} ({})",
        style("Removed").red().bold(),
        style(removed.id).cyan(),
        removed.name
    );
    refresh(&api).await
}

/// Generate a new key for a client
pub async fn gen_key(settings: &Settings, id: ClientId) -> Result<()> {
    let api = api(settings)?;
    let client = api
        .generate_key(id)
        .await
        .with_context(|| format!("Failed to generate key for client {}", id))?;

    println!("{} for client {}", style("Generated key").green().bold(), style(client.id).cyan());
    print_client(&client);
    refresh(&api).await
}

/// Rename a client
pub async fn rename(settings: &Settings, id: ClientId, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Client name must not be empty");
    }

    let api = api(settings)?;
    let client = api
        .update_client(id, name)
        .await
        .with_context(|| format!("Failed to rename client {}", id))?;

    println!("{} client {}", style("Renamed").green().bold(), style(client.id).cyan());
    refresh(&api).await
}

/// Re-render the table after a successful mutation
async fn refresh(api: &ApiClient) -> Result<()> {
    let clients = api
        .list_clients()
        .await
        .context("Mutation succeeded but the client list could not be refreshed")?;

    println!();
    print_table(&render(&clients));
    Ok(())
}

fn print_client(client: &Client) {
    println!("  {} {}", style("ID:  ").dim(), client.id);
    println!("  {} {}", style("Name:").dim(), client.name);
    println!("  {} {}", style("Key: ").dim(), style(display_key(&client.key)).yellow());
}
