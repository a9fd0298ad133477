use clap::Args;

use crate::api::ApiClient;
use crate::cli::utils::{output_structured, parse_key_value, render_table};
use crate::cli::OutputFormat;
use crate::config::PAGE_SIZE_OPTIONS;
use crate::entity::{EntityView, FetchOutcome};
use crate::models::{AuditLogEntry, Domain, EntityKind, Organization, Product, Record, Subscription, User};
use crate::screens::{self, ScreenLayout};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(value_enum, help = "Entity screen to list")]
    pub entity: EntityKind,

    #[arg(long, default_value_t = 1, help = "Page number, starting at 1")]
    pub page: u32,

    #[arg(long, help = "Records per page (10, 25, 50 or 100)")]
    pub page_size: Option<u32>,

    #[arg(long = "filter", value_parser = parse_key_value, help = "Filter as field=value (repeatable)")]
    pub filters: Vec<(String, String)>,

    #[arg(long, help = "Free-text search")]
    pub search: Option<String>,
}

pub async fn handle(args: ListArgs, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match args.entity {
        EntityKind::Organizations => list::<Organization>(args, client, output_format).await,
        EntityKind::Users => list::<User>(args, client, output_format).await,
        EntityKind::Subscriptions => list::<Subscription>(args, client, output_format).await,
        EntityKind::Products => list::<Product>(args, client, output_format).await,
        EntityKind::Domains => list::<Domain>(args, client, output_format).await,
        EntityKind::AuditLog => list::<AuditLogEntry>(args, client, output_format).await,
    }
}

async fn list<T: Record>(args: ListArgs, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let screen = screens::open::<T>(client);
    let layout = screen.layout();

    let mut filters = args.filters;
    if let Some(search) = args.search {
        filters.push(("search".to_string(), search));
    }
    if let Some((field, _)) = filters.iter().find(|(field, _)| !layout.has_filter(field)) {
        anyhow::bail!(
            "'{}' is not a filter of {} (available: {})",
            field,
            layout.kind,
            layout.filter_names().join(", ")
        );
    }
    if let Some(size) = args.page_size {
        if !PAGE_SIZE_OPTIONS.contains(&size) {
            anyhow::bail!("Page size must be one of {:?}", PAGE_SIZE_OPTIONS);
        }
    }
    if args.page == 0 {
        anyhow::bail!("Pages start at 1");
    }

    let data = screen.data();
    data.configure(|store| {
        if let Some(size) = args.page_size {
            store.on_page_size_change(size);
        }
        store.on_filter_change(filters);
        store.on_page_change(args.page - 1);
    })
    .await;
    let outcome = data.fetch().await;
    let view = data.view().await;
    screen.close().await;

    match output_format {
        OutputFormat::Text => print_view(layout, &view),
        _ => output_structured(output_format, &view)?,
    }

    match outcome {
        FetchOutcome::Failed(err) => Err(err.into()),
        _ => Ok(()),
    }
}

fn print_view<T: Record>(layout: &ScreenLayout, view: &EntityView<T>) {
    let active: Vec<String> = view.filters.active().map(|(k, v)| format!("{}={}", k, v)).collect();
    if !active.is_empty() {
        println!("Filters: {}", active.join(" "));
    }

    // errors take the place of the table
    if view.error.is_some() {
        return;
    }

    let pagination = view.pagination;
    let pages = pagination.total.div_ceil(u64::from(pagination.page_size.max(1))).max(1);
    println!(
        "{}: page {} of {}, {} total",
        layout.kind,
        pagination.page.saturating_add(1),
        pages,
        pagination.total
    );
    if view.data.is_empty() {
        println!("No {} found", layout.kind);
        return;
    }

    let columns = T::columns();
    let rows: Vec<Vec<Option<String>>> = view
        .data
        .iter()
        .map(|record| columns.iter().map(|c| record.field(c)).collect())
        .collect();
    println!("{}", render_table(columns, &rows));
}
