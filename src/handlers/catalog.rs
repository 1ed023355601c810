use serde::Serialize;

use crate::domain::catalog::Listing;
use crate::utils::jwt::Claims;

/// A resource plus whether the (optional) viewer owns it.
#[derive(Debug, Serialize)]
pub struct ListingDetail<T: Serialize> {
    #[serde(flatten)]
    pub item: T,
    pub viewer_is_owner: bool,
}

impl<T: Serialize + Listing> ListingDetail<T> {
    pub fn new(item: T, viewer: Option<&Claims>) -> Self {
        let viewer_is_owner = viewer.is_some_and(|c| c.sub == item.owner_id());
        Self {
            item,
            viewer_is_owner,
        }
    }
}
