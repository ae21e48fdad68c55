//! Method name → (payload type, handler), built once at startup.
use std::{collections::HashMap, future::Future};

use futures_util::{future::BoxFuture, FutureExt};
use serde::de::DeserializeOwned;

use super::{methods, Call, RpcError};

pub type HandlerFuture = BoxFuture<'static, Result<(), RpcError>>;

/// An RPC method: its JSON payload type doubles as the schema.
pub trait Method: DeserializeOwned + Send + 'static {
    const NAME: &'static str;

    fn handle(self, call: Call) -> impl Future<Output = Result<(), RpcError>> + Send;
}

type Handler = Box<dyn Fn(Call, &str) -> Result<HandlerFuture, serde_json::Error> + Send + Sync>;

pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<&'static str, Handler>,
}

impl RegistryBuilder {
    pub fn register<M: Method>(mut self) -> Self {
        let handler: Handler = Box::new(|call: Call, json: &str| {
            let payload: M = serde_json::from_str(json)?;
            Ok(payload.handle(call).boxed())
        });
        self.handlers.insert(M::NAME, handler);
        self
    }

    pub fn build(self) -> Registry {
        Registry { handlers: self.handlers }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    UnknownMethod,
    BadPayload,
}

impl Registry {
    pub fn builder() -> RegistryBuilder { RegistryBuilder::default() }

    /// Decode `json` for `method` and produce the handler's future.
    pub fn prepare(&self, method: &str, call: Call, json: &str) -> Result<HandlerFuture, Lookup> {
        let handler = self.handlers.get(method).ok_or(Lookup::UnknownMethod)?;
        handler(call, json).map_err(|_| Lookup::BadPayload)
    }

    pub fn methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}

/// Protocol v0 method set.
pub fn v0() -> Registry {
    Registry::builder()
        .register::<methods::Hello>()
        .register::<methods::Enqueue>()
        .register::<methods::Deque>()
        .register::<methods::Pause>()
        .register::<methods::Resume>()
        .register::<methods::Seek>()
        .build()
}
