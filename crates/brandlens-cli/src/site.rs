//! Site registration.

use brandlens_core::SiteProfile;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum SiteCommands {
    /// Register a site for an owner
    Add {
        /// Owner id
        #[arg(long)]
        owner: i64,

        /// Brand or site name
        #[arg(long)]
        name: String,

        /// Site url; analyses look the site up by this exact value
        #[arg(long)]
        url: String,

        /// One or two sentences on what the site offers
        #[arg(long, default_value = "")]
        description: String,

        /// Language for generated queries
        #[arg(long, default_value = "en")]
        language: String,
    },
}

/// Build a trimmed profile, rejecting inputs no analysis could use.
pub(crate) fn site_profile(
    name: &str,
    url: &str,
    description: &str,
    language: &str,
) -> anyhow::Result<SiteProfile> {
    let name = name.trim();
    let url = url.trim();
    if name.is_empty() {
        anyhow::bail!("site name must not be empty");
    }
    if brandlens_analyzer::registrable_domain(url).is_none() {
        anyhow::bail!("'{url}' has no host name");
    }
    let language = match language.trim() {
        "" => "en",
        other => other,
    };

    Ok(SiteProfile {
        name: name.to_string(),
        url: url.to_string(),
        description: description.trim().to_string(),
        language: language.to_string(),
    })
}

/// Register a site and print its id.
///
/// # Errors
///
/// Returns an error if the inputs are invalid or the insert fails, including
/// when the owner already registered the same url.
pub(crate) async fn run_site_add(
    pool: &sqlx::PgPool,
    owner: i64,
    name: &str,
    url: &str,
    description: &str,
    language: &str,
) -> anyhow::Result<()> {
    let profile = site_profile(name, url, description, language)?;
    let row = brandlens_db::insert_site(pool, owner, &profile).await?;
    tracing::info!(site_id = row.id, owner_id = owner, url = %row.url, "site registered");
    println!("registered site {}: {} ({})", row.id, row.name, row.url);
    Ok(())
}
