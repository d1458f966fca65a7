use exam_core::model::{ExamSerial, WindowStatus};
use services::DashboardEntry;

use super::time_fmt::format_date;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardCardVm {
    pub exam_serial: ExamSerial,
    pub title: String,
    pub window_label: String,
    pub status_label: &'static str,
    pub can_start: bool,
}

#[must_use]
pub fn map_dashboard_cards(entries: &[DashboardEntry]) -> Vec<DashboardCardVm> {
    entries.iter().map(map_dashboard_card).collect()
}

fn map_dashboard_card(entry: &DashboardEntry) -> DashboardCardVm {
    let status_label = match (entry.completed_at, entry.status) {
        (Some(_), _) => "Completed",
        (None, WindowStatus::Open) => "Open",
        (None, WindowStatus::Upcoming) => "Upcoming",
        (None, WindowStatus::Closed) => "Missed",
    };
    DashboardCardVm {
        exam_serial: entry.window.exam_serial,
        title: entry.window.title.clone(),
        window_label: format!(
            "{} to {}",
            format_date(entry.window.opens_at),
            format_date(entry.window.closes_at)
        ),
        status_label,
        can_start: entry.can_start(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::MockWindow;
    use exam_core::time::fixed_now;

    fn entry(status: WindowStatus, completed: bool) -> DashboardEntry {
        DashboardEntry {
            window: MockWindow {
                exam_serial: ExamSerial::new(9),
                title: "Grand Test 9".into(),
                opens_at: fixed_now(),
                closes_at: fixed_now() + Duration::days(2),
            },
            status,
            completed_at: completed.then(fixed_now),
        }
    }

    #[test]
    fn labels_follow_status_and_completion() {
        let cards = map_dashboard_cards(&[
            entry(WindowStatus::Open, false),
            entry(WindowStatus::Open, true),
            entry(WindowStatus::Closed, false),
        ]);
        assert_eq!(cards[0].status_label, "Open");
        assert!(cards[0].can_start);
        assert_eq!(cards[0].window_label, "14 Nov 2023 to 16 Nov 2023");
        assert_eq!(cards[1].status_label, "Completed");
        assert!(!cards[1].can_start);
        assert_eq!(cards[2].status_label, "Missed");
    }
}
