//! Database models.

pub mod item;
pub mod item_meta;
pub mod item_type;
pub mod role;
pub mod site_config;
pub mod user;

pub use item::{CreateItem, Item, UpdateItem};
pub use item_meta::ItemMeta;
pub use item_type::ItemType;
pub use role::Role;
pub use site_config::SiteConfig;
pub use user::{CreateUser, User};
