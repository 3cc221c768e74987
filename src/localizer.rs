//! Localized information service
//!
//! Asks the narrative generator about a query and then looks up the actual
//! nearest place, merging both into one answer. The two calls run one after
//! the other; a failure of either aborts the whole answer.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::Result;
use crate::maps::PoiSearch;
use crate::models::{LocalizedAnswer, PoiQuery};
use crate::narrative::NarrativeGenerator;

/// Combines narrative generation and POI search
#[derive(Clone)]
pub struct LocalizedInformationService {
    narrator: Arc<dyn NarrativeGenerator>,
    places: Arc<dyn PoiSearch>,
}

impl LocalizedInformationService {
    pub fn new(narrator: Arc<dyn NarrativeGenerator>, places: Arc<dyn PoiSearch>) -> Self {
        Self { narrator, places }
    }

    /// Narrative first, then search, for the same query
    #[instrument(skip_all, fields(category = %query.category))]
    pub async fn localize(&self, query: &PoiQuery) -> Result<LocalizedAnswer> {
        let narrative = self.narrator.generate(query).await?;
        let place = self.places.search(query).await?;

        info!(
            "Answer for {} near {} ready",
            query.category,
            query.location.format_coordinates()
        );
        Ok(LocalizedAnswer::new(narrative, place))
    }
}
