//! Tap vs. scroll disambiguation for touch input

use crate::dom::TouchPoint;

/// Minimum stylus travel, in CSS pixels, that counts as a scroll gesture
pub const STYLUS_MOVE_THRESHOLD: f64 = 5.0;

/// Whether a touch sequence ending in `current` moved since `previous` was
/// recorded.
///
/// `previous` is the first changed touch of the last `touchmove`, `None` when
/// no move was recorded (a move without touch data counts as `Some(None)`).
/// Finger moves always count as movement; stylus moves only once they travel
/// at least [`STYLUS_MOVE_THRESHOLD`] on either axis.
pub fn has_moved(current: Option<TouchPoint>, previous: Option<Option<TouchPoint>>) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    let (Some(current), Some(previous)) = (current, previous) else {
        return true;
    };
    if !previous.stylus {
        return true;
    }
    let horizontal = (previous.page_x - current.page_x).abs();
    let vertical = (previous.page_y - current.page_y).abs();
    horizontal >= STYLUS_MOVE_THRESHOLD || vertical >= STYLUS_MOVE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, stylus: bool) -> TouchPoint {
        TouchPoint {
            page_x: x,
            page_y: y,
            stylus,
        }
    }

    #[test]
    fn test_no_recorded_move() {
        assert!(!has_moved(Some(point(0.0, 0.0, false)), None));
        assert!(!has_moved(None, None));
    }

    #[test]
    fn test_finger_move_always_counts() {
        assert!(has_moved(
            Some(point(10.0, 10.0, false)),
            Some(Some(point(10.0, 10.0, false)))
        ));
    }

    #[test]
    fn test_missing_touch_data_counts_as_moved() {
        assert!(has_moved(None, Some(Some(point(0.0, 0.0, true)))));
        assert!(has_moved(Some(point(0.0, 0.0, true)), Some(None)));
    }

    #[test]
    fn test_stylus_threshold() {
        let start = Some(Some(point(100.0, 100.0, true)));
        assert!(!has_moved(Some(point(104.0, 96.0, true)), start));
        assert!(has_moved(Some(point(105.0, 100.0, true)), start));
        assert!(has_moved(Some(point(100.0, 94.0, true)), start));
    }
}
