use crate::core::racer::{Racer, RacerCatalog, RacerId};

pub const FINISH_PROGRESS: f64 = 100.0;
pub const PODIUM_SIZE: usize = 3;

pub fn is_finisher(progress: f64) -> bool {
    progress >= FINISH_PROGRESS
}

/// race_complete is true once every racer of the field is placed. An empty field never
/// completes.
pub fn race_complete(placements: &[RacerId], field: &[RacerId]) -> bool {
    placements.len() == field.len() && !field.is_empty()
}

pub fn winner(placements: &[RacerId]) -> Option<&RacerId> {
    placements.first()
}

/// podium resolves the first three placements to racers. Placements that are not part of the
/// given selection or not in the catalog are skipped.
pub fn podium<'a>(
    placements: &[RacerId],
    selection: &[RacerId],
    catalog: &'a RacerCatalog,
) -> Vec<&'a Racer> {
    placements
        .iter()
        .filter(|&id| selection.contains(id))
        .filter_map(|id| catalog.get(id))
        .take(PODIUM_SIZE)
        .collect()
}

/// record_finishers appends the racers that crossed the line in the same tick. The finishers
/// must be given in field order, which is the tie-break for simultaneous finishes.
pub fn record_finishers(placements: &mut Vec<RacerId>, finishers: &[RacerId]) {
    for id in finishers.iter() {
        if placements.contains(id) {
            panic!("Racer {} was placed twice!", id)
        }
        placements.push(id.to_owned());
    }
}
