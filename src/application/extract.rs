//! Dish extraction helpers on top of the oracle seam: the multi-PDF fan-out
//! and recipe-step backfill.

use crate::domain::model::{Dish, PdfItem};
use crate::domain::traits::Oracle;
use futures_util::future::join_all;

/// A targeted match attributed to the PDF it came from.
#[derive(Debug)]
pub struct PdfMatch {
    pub dish: Dish,
    pub source_url: String,
}

/// Search every PDF for the dish concurrently, then pick the winner by
/// input order.
///
/// This is deliberately gather-all-then-scan, not a race: every call runs to
/// completion (a slow or failing document cannot starve the others), after
/// which results are scanned in the order the PDFs were discovered on the
/// page. Completion latency never decides the winner. A failing call is
/// logged and excluded, never fatal for the batch.
pub async fn find_dish_in_pdfs(
    oracle: &dyn Oracle,
    dish_name: &str,
    items: &[PdfItem],
) -> Option<PdfMatch> {
    if items.is_empty() {
        return None;
    }

    tracing::info!(dish_name, pdfs = items.len(), "parallel search across PDFs");

    let calls = items
        .iter()
        .map(|item| oracle.find_in_pdf(dish_name, &item.data));
    let results = join_all(calls).await;

    for (i, result) in results.into_iter().enumerate() {
        match result {
            Err(e) => {
                tracing::error!(pdf = i + 1, error = %e, "PDF search failed");
            }
            Ok(Some(dish)) => {
                tracing::info!(pdf = i + 1, url = %items[i].url, dish = %dish.name, "found dish in PDF");
                return Some(PdfMatch {
                    dish,
                    source_url: items[i].url.clone(),
                });
            }
            Ok(None) => {}
        }
    }

    tracing::warn!(dish_name, pdfs = items.len(), "dish not found in any PDF");
    None
}

/// Fill in recipe steps for a dish matched without them. An oracle failure
/// leaves the steps empty rather than failing the request.
pub async fn backfill_steps(oracle: &dyn Oracle, dish: &mut Dish) {
    if !dish.steps.is_empty() {
        return;
    }
    match oracle.generate_steps(&dish.name, &dish.ingredients).await {
        Ok(steps) => dish.steps = steps,
        Err(e) => {
            tracing::warn!(dish = %dish.name, error = %e, "step generation failed");
        }
    }
}
