//! Command handlers.
//!
//! Every lead command opens the signed-in user's session, hydrates the lead
//! collection from their document, runs one dashboard action, and persists
//! the selection back to the session file.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _};
use chrono::Utc;
use leadgen_core::{
    load_segments, AppConfig, BrandSearchPreference, Bucket, DocumentStoreKind, Lead, LeadState,
    LookupOutcome, TargetFilter, ViewCache,
};
use leadgen_discovery::{DiscoveryClient, GeminiClient};
use leadgen_sync::{
    DocumentStore, FileDocumentStore, HttpDocumentStore, LocalSessionGate, SessionGate,
    SyncEngine, UserIdentity,
};

use crate::dashboard::Dashboard;
use crate::{render, Commands};

struct Session {
    gate: LocalSessionGate,
    user: UserIdentity,
    sync: SyncEngine,
    dashboard: Dashboard,
}

impl Session {
    async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        let gate = LocalSessionGate::open(&config.data_dir)?;
        let Some(user) = gate.current_user() else {
            bail!("not signed in; run `leadgen login <uid>` first");
        };

        let documents = document_store(config)?;
        let sync = SyncEngine::new(
            documents,
            LeadState::default(),
            Duration::from_millis(config.sync_poll_interval_ms),
        );
        sync.attach(&user)
            .await
            .with_context(|| format!("failed to load leads for user '{}'", user.uid))?;

        let mut dashboard = Dashboard::new(sync.clone(), discovery_client(config)?);
        if let Some(selected) = gate.selected_lead() {
            dashboard.select(Some(selected));
        }

        Ok(Self {
            gate,
            user,
            sync,
            dashboard,
        })
    }

    /// The explicit id, or the selected lead.
    fn target(&self, id: Option<String>) -> anyhow::Result<String> {
        id.or_else(|| self.dashboard.selected().map(str::to_string))
            .context("no lead id given and no lead selected; run `leadgen select <id>`")
    }

    fn sender_name<'a>(&'a self, config: &'a AppConfig) -> &'a str {
        self.user
            .display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(config.sender_name.as_str())
    }

    fn close(self) -> anyhow::Result<()> {
        self.gate
            .set_selected_lead(self.dashboard.selected().map(str::to_string))?;
        Ok(())
    }
}

fn document_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    Ok(match config.document_store {
        DocumentStoreKind::File => Arc::new(FileDocumentStore::new(&config.data_dir)),
        DocumentStoreKind::Http => {
            let url = config
                .document_url
                .as_deref()
                .context("LEADGEN_DOCUMENT_URL is required for the http document store")?;
            Arc::new(HttpDocumentStore::new(
                url,
                config.document_token.clone(),
                config.request_timeout_secs,
            )?)
        }
    })
}

fn discovery_client(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn DiscoveryClient>>> {
    let Some(key) = config
        .gemini_api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
    else {
        return Ok(None);
    };
    let client = GeminiClient::with_base_url(
        key,
        &config.gemini_model,
        config.request_timeout_secs,
        &config.gemini_base_url,
    )?;
    Ok(Some(Arc::new(client)))
}

pub(crate) async fn run(config: &AppConfig, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { uid, name } => {
            let gate = LocalSessionGate::open(&config.data_dir)?;
            gate.sign_in(UserIdentity {
                uid: uid.clone(),
                display_name: name,
            })?;
            println!("signed in as {uid}");
            Ok(())
        }
        Commands::Logout => {
            let gate = LocalSessionGate::open(&config.data_dir)?;
            gate.sign_out()?;
            println!(
                "signed out; local data kept in {}",
                config.data_dir.display()
            );
            Ok(())
        }
        Commands::Segments => run_segments(config),
        Commands::Discover {
            query,
            segment,
            target,
            niche,
        } => {
            let query = resolve_query(config, query, segment.as_deref())?;
            let pref = BrandSearchPreference {
                target_type: target.into(),
                niche: niche.unwrap_or_else(|| config.default_niche.clone()),
            };
            let session = Session::open(config).await?;
            let added = session.dashboard.discover(&query, &pref).await?;
            if added.is_empty() {
                println!("no new brands found for \"{query}\"");
            } else {
                println!("added {} new lead(s):", added.len());
                let refs: Vec<_> = added.iter().collect();
                print!(
                    "{}",
                    render::lead_table(&refs, Bucket::Active, TargetFilter::All, None)
                );
            }
            session.close()
        }
        Commands::Lookup { brand } => {
            let mut session = Session::open(config).await?;
            match session.dashboard.lookup(&brand).await? {
                Some(LookupOutcome::Existing { lead, bucket }) => {
                    println!("already tracked in {bucket}: {} ({})", lead.name, lead.id);
                }
                Some(LookupOutcome::Created(lead)) => {
                    println!("added {} ({})", lead.name, lead.id);
                }
                None => println!("no brand found for \"{brand}\""),
            }
            session.close()
        }
        Commands::List { bucket, target } => {
            let session = Session::open(config).await?;
            let store = session.dashboard.state().snapshot();
            println!("{}", render::counts_line(&store.bucket_counts()));
            let view = store.derive_view(bucket, target);
            print!(
                "{}",
                render::lead_table(&view, bucket, target, session.dashboard.selected())
            );
            Ok(())
        }
        Commands::Show { id } => {
            let session = Session::open(config).await?;
            let id = session.target(id)?;
            let store = session.dashboard.state().snapshot();
            let lead = store
                .get(&id)
                .with_context(|| format!("lead '{id}' not found"))?;
            print!("{}", render::lead_detail(lead));
            Ok(())
        }
        Commands::Select { id } => {
            let mut session = Session::open(config).await?;
            if !session.dashboard.select(Some(id.clone())) {
                bail!("lead '{id}' not found");
            }
            println!("selected {id}");
            session.close()
        }
        Commands::Investigate { id, all } => {
            let session = Session::open(config).await?;
            if all {
                let outcome = session.dashboard.investigate_all().await?;
                if outcome.started == 0 {
                    println!("no new leads to investigate");
                } else {
                    println!(
                        "investigated {}: {} ready, {} back to new",
                        outcome.started,
                        outcome.ready.len(),
                        outcome.reverted.len()
                    );
                }
            } else {
                let id = session.target(id)?;
                match session.dashboard.investigate(&id).await? {
                    Some(lead) => println!(
                        "{} is {}; contact: {}",
                        lead.name,
                        lead.status,
                        lead.contact_email.as_deref().unwrap_or("none")
                    ),
                    None => println!("lead '{id}' was not investigated"),
                }
            }
            session.close()
        }
        Commands::Archive { id } => {
            let mut session = Session::open(config).await?;
            let id = session.target(id)?;
            report(session.dashboard.archive(&id).await, "archived", &id);
            session.close()
        }
        Commands::Unarchive { id } => {
            let session = Session::open(config).await?;
            let id = session.target(id)?;
            report(session.dashboard.unarchive(&id).await, "restored", &id);
            session.close()
        }
        Commands::Asset { selector, id } => {
            let segments = load_segments(&config.segments_path)?;
            let asset = segments
                .asset(&selector)
                .with_context(|| format!("no follow-up asset matches '{selector}'"))?;
            let session = Session::open(config).await?;
            let id = session.target(id)?;
            match session.dashboard.toggle_asset(&id, &asset.url).await {
                Some(lead) if lead.follow_up_asset_url.is_some() => {
                    println!("{}: attached {}", lead.name, asset.label);
                }
                Some(lead) => println!("{}: cleared follow-up asset", lead.name),
                None => println!("lead '{id}' unchanged"),
            }
            session.close()
        }
        Commands::Draft { kind, id } => {
            let session = Session::open(config).await?;
            let id = session.target(id)?;
            let sender = session.sender_name(config).to_string();
            match session.dashboard.draft(&id, kind, &sender).await? {
                Some(text) => println!("{text}"),
                None => println!("no draft generated for '{id}'"),
            }
            session.close()
        }
        Commands::EditDraft { kind, id, text } => {
            let session = Session::open(config).await?;
            let id = session.target(id)?;
            let updated = session.dashboard.edit_draft(&id, kind, text).await;
            report(updated, "updated draft for", &id);
            session.close()
        }
        Commands::Send { id, open } => {
            let session = Session::open(config).await?;
            let id = session.target(id)?;
            match session.dashboard.send_initial(&id, Utc::now()).await {
                Some(link) => deliver(&link, open),
                None => println!("nothing sent; '{id}' needs a contact email"),
            }
            session.close()
        }
        Commands::FollowUp {
            id,
            kind,
            note,
            open,
        } => {
            let session = Session::open(config).await?;
            let id = session.target(id)?;
            match session
                .dashboard
                .send_follow_up(&id, kind.into(), note, Utc::now())
                .await
            {
                Some(link) => deliver(&link, open),
                None => println!("nothing sent; '{id}' needs a contact email"),
            }
            session.close()
        }
        Commands::Watch { bucket, target } => run_watch(config, bucket, target).await,
    }
}

fn report(lead: Option<Lead>, verb: &str, id: &str) {
    match lead {
        Some(lead) => println!("{verb} {} ({})", lead.name, lead.id),
        None => println!("lead '{id}' unchanged"),
    }
}

fn resolve_query(
    config: &AppConfig,
    query: Option<String>,
    segment: Option<&str>,
) -> anyhow::Result<String> {
    if let Some(segment_id) = segment {
        let segments = load_segments(&config.segments_path)?;
        let segment = segments
            .segment(segment_id)
            .with_context(|| format!("unknown segment '{segment_id}'"))?;
        return Ok(segment.query.clone());
    }
    match query.map(|q| q.trim().to_string()) {
        Some(q) if !q.is_empty() => Ok(q),
        _ => bail!("give a search query or --segment <id>"),
    }
}

fn run_segments(config: &AppConfig) -> anyhow::Result<()> {
    let segments = load_segments(&config.segments_path)?;
    println!("{:<12}{:<24}QUERY", "ID", "LABEL");
    for segment in &segments.segments {
        println!("{:<12}{:<24}{}", segment.id, segment.label, segment.query);
    }
    if !segments.assets.is_empty() {
        println!();
        println!("Follow-up assets:");
        for (i, asset) in segments.assets.iter().enumerate() {
            println!("  {}. {:<24}{}", i + 1, asset.label, asset.url);
        }
    }
    Ok(())
}

/// Print the link, and hand it to the system opener when asked.
fn deliver(link: &str, open: bool) {
    println!("{link}");
    if !open {
        return;
    }
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    if let Err(e) = std::process::Command::new(opener).arg(link).spawn() {
        tracing::warn!(opener, error = %e, "failed to open mail client");
    }
}

async fn run_watch(config: &AppConfig, bucket: Bucket, target: TargetFilter) -> anyhow::Result<()> {
    let session = Session::open(config).await?;
    // Live polling runs for as long as the gate reports a signed-in user.
    let follower = session.sync.follow(session.gate.subscribe());

    let state = session.dashboard.state().clone();
    let mut changes = state.subscribe();
    let mut cache = ViewCache::new();

    let print_view = |cache: &mut ViewCache| {
        let store = state.snapshot();
        let view = cache.view(&store, bucket, target);
        println!("{}", render::counts_line(&store.bucket_counts()));
        print!(
            "{}",
            render::lead_table(&view, bucket, target, session.dashboard.selected())
        );
    };

    print_view(&mut cache);
    println!("watching {bucket} ({target}); Ctrl-C to stop");

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                println!();
                print_view(&mut cache);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    follower.abort();
    session.sync.stop().await;
    tracing::debug!(recomputes = cache.recomputes(), "watch finished");
    Ok(())
}
