use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detail::Coordinate;

/// Forward geocoding, fulfilled by the shell's platform geocoder.
#[derive(Clone)]
pub struct Geocode<Ev> {
    context: CapabilityContext<GeocodeOperation, Ev>,
}

impl<Ev> Capability<Ev> for Geocode<Ev> {
    type Operation = GeocodeOperation;
    type MappedSelf<MappedEv> = Geocode<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geocode::new(self.context.map_event(f))
    }
}

impl<Ev> Geocode<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeocodeOperation, Ev>) -> Self {
        Self { context }
    }

    /// Resolves a free-text address. The callback runs once with the terminal
    /// result.
    pub fn resolve<F>(&self, address: impl Into<String>, callback: F)
    where
        F: FnOnce(GeocodeResult) -> Ev + Send + 'static,
    {
        let operation = GeocodeOperation::Resolve {
            address: address.into(),
        };
        self.context.spawn({
            let context = self.context.clone();
            async move {
                let result = context.request_from_shell(operation).await;
                context.update_app(callback(result));
            }
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeocodeOperation {
    Resolve { address: String },
}

impl Operation for GeocodeOperation {
    type Output = GeocodeResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("no place matches the address")]
    NoResult,

    #[error("geocoding service failed: {message}")]
    Service { message: String },

    #[error("geocoding request was cancelled")]
    Cancelled,
}

pub type GeocodeResult = Result<Coordinate, GeocodeError>;
