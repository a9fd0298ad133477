use std::marker::PhantomData;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ListQuery};
use crate::error::FetchError;

/// Entity-specific fetch function plus record mapper
#[async_trait]
pub trait EntitySource<T>: Send + Sync {
    /// Used in log lines
    fn name(&self) -> &str;

    /// Raw list response body for `query`; must honour `cancel`
    async fn fetch(&self, query: &ListQuery, cancel: &CancellationToken) -> Result<Value, FetchError>;

    fn map_record(&self, raw: Value) -> Result<T, FetchError>;
}

/// List endpoint of the CRM API
pub struct EndpointSource<T> {
    client: ApiClient,
    path: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> EndpointSource<T> {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self { client, path: path.into(), _record: PhantomData }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl<T: DeserializeOwned> EntitySource<T> for EndpointSource<T> {
    fn name(&self) -> &str {
        self.path.trim_start_matches('/')
    }

    async fn fetch(&self, query: &ListQuery, cancel: &CancellationToken) -> Result<Value, FetchError> {
        self.client.list(&self.path, query, cancel).await
    }

    fn map_record(&self, raw: Value) -> Result<T, FetchError> {
        Ok(serde_json::from_value(raw)?)
    }
}

type FetchFn = dyn Fn(ListQuery, CancellationToken) -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync;
type MapFn<T> = dyn Fn(Value) -> Result<T, FetchError> + Send + Sync;

/// Source built from closures
pub struct FnSource<T> {
    name: String,
    fetch: Box<FetchFn>,
    map: Box<MapFn<T>>,
}

impl<T: DeserializeOwned + 'static> FnSource<T> {
    pub fn new<F>(name: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(ListQuery, CancellationToken) -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            fetch: Box::new(fetch),
            map: Box::new(|raw: Value| -> Result<T, FetchError> { Ok(serde_json::from_value(raw)?) }),
        }
    }
}

impl<T> FnSource<T> {
    pub fn with_mapper<M>(mut self, map: M) -> Self
    where
        M: Fn(Value) -> Result<T, FetchError> + Send + Sync + 'static,
    {
        self.map = Box::new(map);
        self
    }
}

#[async_trait]
impl<T> EntitySource<T> for FnSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &ListQuery, cancel: &CancellationToken) -> Result<Value, FetchError> {
        (self.fetch)(query.clone(), cancel.clone()).await
    }

    fn map_record(&self, raw: Value) -> Result<T, FetchError> {
        (self.map)(raw)
    }
}
