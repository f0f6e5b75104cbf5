pub mod codec;
pub mod error;
pub mod field;
pub mod layout;
pub mod program;
pub mod reshape;
pub mod shape;
pub mod texture;
pub mod types;
pub mod utils;
pub mod value;

pub use error::{FieldError, Result};
pub use field::{Field, PlaceNode};
pub use layout::Layout;
pub use program::{Program, TreeIndex};
pub use shape::Shape;
pub use texture::{CanvasTexture, Texture, TextureBase, TextureId};
pub use types::{ElementType, PrimitiveKind, Property, TypeCategory, TypeKind};
pub use value::{NdArray, Value};
