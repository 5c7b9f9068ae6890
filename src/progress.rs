//! Cohort-relative progress metrics derived from a student's timeline.

use crate::pathway::Pathway;
use crate::records::StudentTimeline;

/// Semester numbers advance by two between consecutive Fall/Spring terms.
const TERM_STEP: u32 = 2;

/// Minimum number of the first four Fall/Spring terms that must appear in a
/// timeline before fourth-term completion is judged on its merits.
const MIN_TRACKED_TERMS: usize = 3;

/// Number of core-pathway requirements (0 to 3) the student took, or passed
/// when `passing_only` is set.
///
/// Students without a pathway (the comparison group) never take the
/// program's pathway courses and always score 0.
pub fn compute_progress(
    timeline: &StudentTimeline,
    pathway: Option<&Pathway>,
    passing_only: bool,
) -> u8 {
    let Some(pathway) = pathway else {
        return 0;
    };
    let courses = timeline.courses(passing_only);

    pathway
        .requirements()
        .into_iter()
        .filter(|(_, options)| options.iter().any(|c| courses.contains(c.as_str())))
        .count() as u8
}

/// Whether the student completed coursework in their fourth Fall/Spring term.
///
/// The fourth term is `cohort_start + 6`. The result is `false` when that
/// term is missing, when fewer than three of the first four terms were
/// recorded, or when every grade in the fourth term is a withdrawal or
/// incomplete. Insufficient history is reported as `false`, not as unknown.
pub fn compute_fourth_term_completion(timeline: &StudentTimeline, cohort_start: u32) -> bool {
    let target = cohort_start + 3 * TERM_STEP;

    let Some(fourth) = timeline.get(target) else {
        return false;
    };

    let tracked = (0..4)
        .map(|i| cohort_start + i * TERM_STEP)
        .filter(|semester| timeline.contains(*semester))
        .count();
    if tracked < MIN_TRACKED_TERMS {
        return false;
    }

    if fourth.is_empty() {
        return false;
    }
    fourth
        .observations()
        .iter()
        .any(|obs| !obs.grade.is_incomplete())
}
