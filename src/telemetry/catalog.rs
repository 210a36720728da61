/*!
 * Algorithm Catalog
 * Fixed set of collection algorithms credited in the activity log
 */

use super::types::Algorithm;

/// Catalog id used when settings do not name one
pub const DEFAULT_ALGORITHM_ID: u32 = 2;

const CATALOG: [(u32, &str, &str, u8); 4] = [
    (
        1,
        "Mark-Sweep",
        "A basic GC algorithm that marks all reachable objects and then sweeps away the unmarked ones.",
        72,
    ),
    (
        2,
        "Generational",
        "Groups objects by age and collects younger generations more frequently than older ones.",
        89,
    ),
    (
        3,
        "Reference Counting",
        "Keeps track of the number of references to each object and collects when count reaches zero.",
        65,
    ),
    (
        4,
        "Concurrent GC",
        "Performs collection alongside program execution to minimize pauses.",
        78,
    ),
];

/// Build the catalog; every entry starts enabled
pub fn default_catalog() -> Vec<Algorithm> {
    CATALOG
        .iter()
        .map(|&(id, name, description, score)| Algorithm {
            id,
            name: name.to_string(),
            description: description.to_string(),
            enabled: true,
            performance_score: score,
        })
        .collect()
}
