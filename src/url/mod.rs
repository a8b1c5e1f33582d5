//! URL utilities: validation, canonicalization, domain extraction

mod domain;
mod normalize;

pub use domain::{bare_domain_name, extract_domain, origin, registered_domain};
pub use normalize::{canonicalize, ensure_scheme, is_valid_url};
