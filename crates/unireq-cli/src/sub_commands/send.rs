use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::Args;
use serde_json::Value;
use unireq::{
    Adapter, AdapterKind, HttpAdapter, Method, QueryParams, TracingObserver, Transport,
    TransportBuilder,
};
use url::Url;

use crate::config::{Backend, Settings};

#[derive(Args, Debug)]
pub struct SendSubCommand {
    /// Absolute URL, or a path resolved against the configured base URL
    url: String,
    /// Query parameter; repeat a key to send a list
    #[arg(short = 'q', long = "query", value_parser = parse_query_pair)]
    query: Vec<(String, String)>,
    /// Extra header
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
    /// JSON body
    #[arg(long)]
    body: Option<String>,
    /// Bearer token
    #[arg(long)]
    token: Option<String>,
    /// Adapter kind
    #[arg(long)]
    adapter: Option<AdapterKind>,
    /// Transport backend
    #[arg(long)]
    backend: Option<Backend>,
}

fn parse_query_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{}`", s))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name:value, got `{}`", s))
}

fn resolve_url(base_url: Option<&str>, target: &str) -> Result<String> {
    if let Ok(url) = Url::parse(target) {
        return Ok(url.to_string());
    }

    let base = base_url.ok_or_else(|| anyhow!("relative URL `{}` needs a base URL", target))?;
    let base = Url::parse(base)?;
    Ok(base.join(target)?.to_string())
}

fn transport(settings: &Settings) -> Result<Box<dyn Transport>> {
    let mut builder =
        TransportBuilder::default().danger_accept_invalid_certs(settings.accept_invalid_certs);

    if let Some(timeout) = settings.timeout_secs {
        builder = builder.timeout(Duration::from_secs(timeout));
    }

    if let Some(proxy) = &settings.proxy {
        builder = builder.proxy(Url::parse(proxy)?);
    }

    let transport: Box<dyn Transport> = match settings.backend {
        #[cfg(feature = "reqwest")]
        Backend::Reqwest => Box::new(builder.build_reqwest()?),
        #[cfg(feature = "bitreq")]
        Backend::Bitreq => Box::new(builder.build_bitreq()?),
        #[allow(unreachable_patterns)]
        _ => bail!("requested backend is not enabled in this build"),
    };

    Ok(transport)
}

pub async fn send(
    mut settings: Settings,
    method: Method,
    sub_command_args: &SendSubCommand,
) -> Result<()> {
    if let Some(token) = &sub_command_args.token {
        settings.token = Some(token.clone());
    }
    if let Some(adapter) = sub_command_args.adapter {
        settings.adapter = adapter;
    }
    if let Some(backend) = sub_command_args.backend {
        settings.backend = backend;
    }
    tracing::debug!(settings = ?settings, "Effective settings");

    let body: Option<Value> = match &sub_command_args.body {
        Some(_) if method == Method::Get => bail!("GET does not take a body"),
        Some(body) => Some(serde_json::from_str(body)?),
        None => None,
    };

    let mut query = QueryParams::new();
    for (key, value) in &sub_command_args.query {
        query.append(key.as_str(), value.as_str());
    }

    let mut builder = Adapter::builder(settings.adapter)
        .shared_transport(transport(&settings)?.into())
        .error_observer(TracingObserver);
    for (name, value) in &settings.headers {
        builder = builder.default_header(name.as_str(), value.as_str());
    }
    for (name, value) in &sub_command_args.headers {
        builder = builder.default_header(name.as_str(), value.as_str());
    }
    if let Some(token) = &settings.token {
        builder = builder.token(token.as_str());
    }
    let adapter = builder.build()?;

    let url = resolve_url(settings.base_url.as_deref(), &sub_command_args.url)?;
    let query = (!query.is_empty()).then_some(&query);

    let envelope = match method {
        Method::Get => adapter.get(&url, query, None).await?,
        Method::Delete => adapter.delete(&url, query, body.as_ref(), None).await?,
        Method::Put => adapter.put(&url, query, body.as_ref(), None).await?,
        Method::Patch => adapter.patch(&url, query, body.as_ref(), None).await?,
        Method::Post => adapter.post(&url, query, body.as_ref(), None).await?,
    };

    println!("{}", serde_json::to_string_pretty(&envelope)?);

    Ok(())
}
