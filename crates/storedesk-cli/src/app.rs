//! Application state and command handlers.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use storedesk_core::auth::{LoginFlow, Navigation, SessionGate};
use storedesk_core::listing::{filter_and_page, ListQuery, Listable};
use storedesk_core::media::MediaGallery;
use storedesk_core::models::OrderStatus;
use storedesk_core::routes::FormTarget;
use storedesk_core::{ApiClient, Config, CredentialStore, Resource, Route};

use crate::render::{self, TableRow};

/// Environment variable pre-filling the login username
const ENV_USERNAME: &str = "STOREDESK_USERNAME";

const SIGN_IN_HINT: &str = "Not signed in or session expired. Run `storedesk login` first.";

pub struct App {
    config: Config,
    store: CredentialStore,
    api: ApiClient,
    gate: SessionGate,
}

impl App {
    /// Create a new application instance from the saved config
    pub fn new(api_override: Option<String>) -> Result<Self> {
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        if let Some(url) = api_override {
            config.api_base_url = url;
        }
        debug!(api = %config.api_base_url, backend = ?config.credential_backend, "Config loaded");

        let store = config.credential_store()?;
        Self::with_store(config, store)
    }

    /// Build the application around an already opened credential store.
    pub fn with_store(config: Config, store: CredentialStore) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url, store.clone())?;
        let gate = SessionGate::new(store.clone());

        Ok(Self {
            config,
            store,
            api,
            gate,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Guard a protected route; fails with a sign-in hint on redirect.
    fn enter(&self, route: Route) -> Result<()> {
        match self.gate.guard(route) {
            Navigation::Render(_) => Ok(()),
            Navigation::Redirect(target) => {
                info!(route = %route, redirect = %target, "Navigation redirected");
                bail!(SIGN_IN_HINT)
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, username: Option<String>, password: Option<String>) -> Result<()> {
        let username = match username
            .or_else(|| std::env::var(ENV_USERNAME).ok())
            .filter(|u| !u.trim().is_empty())
        {
            Some(u) => u,
            None => Self::prompt_username(self.config.last_username.as_deref())?,
        };
        let password = match password.filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => Self::prompt_password()?,
        };

        let flow = LoginFlow::new(self.api.clone(), self.store.clone());
        match flow.login(&username, &password).await {
            Ok(outcome) => {
                self.config.last_username = Some(username.trim().to_string());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                println!("Login successful, continue at {}", outcome.destination);
                Ok(())
            }
            // LoginFlow has already logged the failure
            Err(e) => bail!(e.user_message()),
        }
    }

    fn prompt_username(last: Option<&str>) -> Result<String> {
        match last {
            Some(last) => print!("Username [{}]: ", last),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        Ok(match last {
            Some(last) if input.is_empty() => last.to_string(),
            _ => input.to_string(),
        })
    }

    fn prompt_password() -> Result<String> {
        let password = rpassword::prompt_password("Password: ")?;
        Ok(password)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.clear()?;
        println!("Signed out");
        Ok(())
    }

    pub fn status(&self) {
        println!("{}", render::session(&self.gate.evaluate()));
    }

    /// Resolve a path the way the router would and report the outcome.
    pub fn open(&self, path: &str) -> Result<()> {
        let route = Route::parse(path);
        match self.gate.guard(route) {
            Navigation::Render(Route::NotFound) => println!("{}: page not found", path),
            Navigation::Render(route) => println!("Rendering {}", route),
            Navigation::Redirect(target) => {
                println!("Redirecting to {}", target);
                bail!(SIGN_IN_HINT)
            }
        }
        Ok(())
    }

    // =========================================================================
    // Resources
    // =========================================================================

    pub async fn list(&self, resource: Resource, query: ListQuery) -> Result<()> {
        self.enter(Route::List(resource))?;

        let out = match resource {
            Resource::StoreInfo => page_of(resource, &self.api.fetch_store_infos().await?, &query)?,
            Resource::Branch => page_of(resource, &self.api.fetch_branches().await?, &query)?,
            Resource::Category => page_of(resource, &self.api.fetch_categories().await?, &query)?,
            Resource::User => page_of(resource, &self.api.fetch_users().await?, &query)?,
            Resource::Product => page_of(resource, &self.api.fetch_products().await?, &query)?,
            Resource::Order => page_of(resource, &self.api.fetch_orders().await?, &query)?,
        };
        print!("{}", out);
        Ok(())
    }

    pub async fn show(&self, resource: Resource, id: i64) -> Result<()> {
        self.enter(Route::Form(resource, FormTarget::Existing(id)))?;

        let record = match resource {
            Resource::StoreInfo => serde_json::to_value(self.api.fetch_store_info(id).await?)?,
            Resource::Branch => serde_json::to_value(self.api.fetch_branch(id).await?)?,
            Resource::Category => serde_json::to_value(self.api.fetch_category(id).await?)?,
            Resource::User => serde_json::to_value(self.api.fetch_user(id).await?)?,
            Resource::Product => serde_json::to_value(self.api.fetch_product(id).await?)?,
            Resource::Order => serde_json::to_value(self.api.fetch_order(id).await?)?,
        };
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }

    /// Submit a record form: create when `target` is [`FormTarget::Create`],
    /// otherwise update the record with that id.
    pub async fn save(&self, resource: Resource, target: FormTarget, file: &Path) -> Result<()> {
        self.enter(Route::Form(resource, target))?;

        let contents = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let record = form_record(&contents, target)?;

        let saved = match resource {
            Resource::StoreInfo => echo(self.api.save_store_info(&typed(record, resource)?).await?)?,
            Resource::Branch => echo(self.api.save_branch(&typed(record, resource)?).await?)?,
            Resource::Category => echo(self.api.save_category(&typed(record, resource)?).await?)?,
            Resource::User => echo(self.api.save_user(&typed(record, resource)?).await?)?,
            Resource::Product => echo(self.api.save_product(&typed(record, resource)?).await?)?,
            Resource::Order => bail!("Orders are changed with `storedesk order-status`"),
        };

        match target {
            FormTarget::Create => println!("Created {}", resource.display_name()),
            FormTarget::Existing(id) => println!("Updated {} {}", resource.display_name(), id),
        }
        if let Some(saved) = saved {
            println!("{}", saved);
        }
        Ok(())
    }

    pub async fn delete(&self, resource: Resource, id: i64) -> Result<()> {
        self.enter(Route::List(resource))?;

        self.api.delete_record(resource, id).await?;
        info!(resource = resource.segment(), id, "Record deleted");
        println!("Deleted {} {}", resource.display_name(), id);
        Ok(())
    }

    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<()> {
        self.enter(Route::Form(Resource::Order, FormTarget::Existing(id)))?;

        self.api.update_order_status(id, status).await?;
        println!("Order {} is now {}", id, status.display_name());
        Ok(())
    }

    /// Show a product's image strip with `add` and `remove` applied, and
    /// what saving the product would send to the media service.
    pub async fn media(&self, product_id: i64, add: Vec<PathBuf>, remove: Vec<usize>) -> Result<()> {
        self.enter(Route::Form(Resource::Product, FormTarget::Existing(product_id)))?;

        let product = self.api.fetch_product(product_id).await?;
        let stored = match product.file_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => self.api.fetch_product_media(key).await?,
            None => Vec::new(),
        };
        let mut gallery = MediaGallery::from_stored(product.file_key.clone(), stored);

        if !add.is_empty() {
            let added = gallery.select_files(add)?;
            debug!(added, "Selected new images");
        }
        for index in remove {
            if gallery.remove_preview(index).is_none() {
                warn!(index, "No image at position");
            }
        }

        print!("{}", render::gallery(&gallery, &gallery.submission_plan()));
        Ok(())
    }
}

fn page_of<T: Listable + TableRow>(resource: Resource, items: &[T], query: &ListQuery) -> Result<String> {
    query.validate::<T>()?;
    let page = filter_and_page(items, query, resource.page_size());
    Ok(render::table(resource.display_name(), &page))
}

/// Form fields from a JSON object. A new record never carries an id; an
/// update always carries the id it targets.
fn form_record(contents: &str, target: FormTarget) -> Result<Value> {
    let mut record: Value = serde_json::from_str(contents).context("Record file is not valid JSON")?;
    let Some(fields) = record.as_object_mut() else {
        bail!("Record file must hold a JSON object");
    };
    match target {
        FormTarget::Create => {
            fields.remove("id");
        }
        FormTarget::Existing(id) => {
            fields.insert("id".to_string(), Value::from(id));
        }
    }
    Ok(record)
}

fn typed<T: DeserializeOwned>(record: Value, resource: Resource) -> Result<T> {
    serde_json::from_value(record)
        .with_context(|| format!("Record does not fit the {} form", resource.display_name()))
}

fn echo<T: Serialize>(saved: Option<T>) -> Result<Option<String>> {
    saved
        .map(|record| serde_json::to_string_pretty(&record))
        .transpose()
        .map_err(Into::into)
}
