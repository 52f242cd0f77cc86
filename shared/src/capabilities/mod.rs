mod geocode;
pub mod kv;

pub use self::geocode::{Geocode, GeocodeError, GeocodeOperation, GeocodeResult};
pub use self::kv::{KvError, KvKey};

// We use Crux's built-in Render capability directly because it provides
// all necessary functionality for triggering view updates.
pub use crux_core::render::Render;
pub use crux_kv::KeyValue;

use crate::event::Event;
// Referenced by the Effect derive.
#[allow(unused_imports)]
use crate::App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub key_value: KeyValue<Event>,
    pub render: Render<Event>,
    pub geocode: Geocode<Event>,
}
