//! `list`: one page of a list resource, fetched the way a list page does.

use console_api::ListMeta;
use console_core::{
    FilterItem, FilterStore, FilterValue, ListApi, Navigator, PaginationQuery, QuerySynchronizer,
    SessionStatus,
};
use serde::Serialize;
use serde_json::Value;

use crate::context::Context;
use crate::CtlError;

pub struct ListArgs {
    pub category: String,
    pub path: String,
    pub page: u32,
    pub limit: Option<u32>,
    pub filters: Vec<String>,
    pub toggles: Vec<String>,
    pub clears: Vec<String>,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    query: &'a PaginationQuery,
    meta: ListMeta,
    data: Vec<Value>,
}

pub fn run(ctx: &Context, args: &ListArgs) -> Result<(), CtlError> {
    let filters = build_filters(args)?;

    let route = format!("{}?page={}", args.category, args.page);
    let nav = ctx.navigator(&route)?;
    let mut session = ctx.session(nav.clone());
    session.start();
    if session.status() != SessionStatus::AuthSuccessful {
        return Err(CtlError::NotSignedIn(session.status()));
    }

    let limit = args.limit.unwrap_or(ctx.config.default_page_limit);
    let mut query = QuerySynchronizer::mount(&args.category, limit, &nav.location(), &filters);
    let Some(ticket) = query.next_fetch() else {
        return Ok(());
    };

    let client = ctx.client.clone();
    let page = match session.authorize(|token| client.fetch_page(token, &args.path, &ticket.query)) {
        Ok(page) => page,
        Err(err) => {
            query.on_fetch_failure(&ticket);
            return Err(err.into());
        }
    };
    query.on_fetch_success(&ticket, &page.meta);

    let output = ListOutput {
        query: query.query(),
        meta: page.meta,
        data: page.data,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_filters(args: &ListArgs) -> Result<FilterStore, CtlError> {
    let mut store = FilterStore::new();
    for raw in &args.filters {
        let (key, value) = split_pair(raw)?;
        store.set_filter(&args.category, key, Some(FilterValue::from(parse_item(value))));
    }
    for raw in &args.toggles {
        let (key, value) = split_pair(raw)?;
        store.toggle_filter(&args.category, key, parse_item(value));
    }
    for key in &args.clears {
        store.set_filter(&args.category, key, None);
    }
    Ok(store)
}

fn split_pair(raw: &str) -> Result<(&str, &str), CtlError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(CtlError::InvalidArgument(format!(
            "expected KEY=VALUE, got '{}'",
            raw
        ))),
    }
}

fn parse_item(value: &str) -> FilterItem {
    match value {
        "true" => FilterItem::Flag(true),
        "false" => FilterItem::Flag(false),
        other => FilterItem::from(other),
    }
}
