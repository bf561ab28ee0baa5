//! Location discovery and access resolution for field users.
//!
//! This crate owns the decision logic behind the map screen: turning a raw
//! candidate set plus a search origin (or a drawn rectangle) into a ranked,
//! bounded result list, and deciding per record whether the acting user may
//! view, edit, delete, or lock it. Storage, geolocation, and rendering are
//! collaborators reached through the traits in [`provider`]; the host owns
//! the widgets and only consumes [`mode::Action`]s and [`markers::Marker`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`record`] | Location records, identities, search settings |
//! | [`geo`] | Geographic points and haversine distance |
//! | [`merge`] | Identity-based merge of a general pool and a priority list |
//! | [`proximity`] | Nearest-N search with optional radius cutoff |
//! | [`area`] | Rectangle normalization and bounding-box filtering |
//! | [`draw`] | Pointer gesture state machine for drawing a search rectangle |
//! | [`mode`] | NEAREST / AREA mode controller and host actions |
//! | [`access`] | Role-scoped permission tables and the access resolver |
//! | [`markers`] | Pure projection from results to renderable markers |
//! | [`provider`] | Collaborator traits (store, settings, permissions, origin) |
//! | [`session`] | Async driver wiring collaborators to the mode controller |
//! | [`consts`] | Shared numeric constants |

pub mod access;
pub mod area;
pub mod consts;
pub mod draw;
pub mod geo;
pub mod markers;
pub mod merge;
pub mod mode;
pub mod provider;
pub mod proximity;
pub mod record;
pub mod session;
