use crate::config::GridConfig;
use crate::geometry::{Point, Quad};
use crate::ocr::OcrToken;

/// A name line matched with the rating printed under it.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedRating {
    pub name: String,
    pub name_bounds: Quad,
    pub rating: String,
    pub rating_bounds: Quad,
}

impl NamedRating {
    /// Centre of the box spanning name and rating.
    pub fn centroid(&self) -> Point {
        self.name_bounds.union(&self.rating_bounds).center()
    }
}

/// Index of the closest unused rating directly below `name`, if any.
fn nearest_rating_below(
    name: &Quad,
    ratings: &[OcrToken],
    used: &[bool],
    config: &GridConfig,
) -> Option<usize> {
    let name_center = name.center();
    let mut best: Option<(usize, f32)> = None;

    for (idx, rating) in ratings.iter().enumerate() {
        if used[idx] {
            continue;
        }
        let dy = rating.bounds.top() - name.bottom();
        // Allow the rating box to touch or slightly overlap the name box
        if dy < -name.height() / 2.0 || dy > config.pair_max_dy {
            continue;
        }
        let rating_center = rating.bounds.center();
        if (rating_center.x - name_center.x).abs() > config.pair_max_dx {
            continue;
        }
        let distance = name_center.distance(&rating_center);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((idx, distance));
        }
    }

    best.map(|(idx, _)| idx)
}

/// Index of an unused name line sitting between `first` and its rating.
fn second_name_line(
    first_idx: usize,
    names: &[OcrToken],
    used: &[bool],
    rating: &Quad,
    config: &GridConfig,
) -> Option<usize> {
    let first = names[first_idx].bounds;
    let first_center = first.center();
    let rating_center = rating.center();

    names
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != first_idx && !used[*idx])
        .filter(|(_, name)| {
            let c = name.bounds.center();
            c.y > first_center.y
                && c.y < rating_center.y
                && (c.x - first_center.x).abs() <= config.pair_max_dx
        })
        .min_by(|(_, a), (_, b)| a.bounds.top().total_cmp(&b.bounds.top()))
        .map(|(idx, _)| idx)
}

/// Pairs each name candidate with the rating below it, one-to-one.
///
/// Names are visited in the order given (reading order). A second name line
/// between a name and its rating is folded into the name.
pub fn pair_names_with_ratings(
    names: &[OcrToken],
    ratings: &[OcrToken],
    config: &GridConfig,
) -> Vec<NamedRating> {
    let mut used_names = vec![false; names.len()];
    let mut used_ratings = vec![false; ratings.len()];
    let mut pairs = Vec::new();

    for idx in 0..names.len() {
        if used_names[idx] {
            continue;
        }

        let Some(rating_idx) =
            nearest_rating_below(&names[idx].bounds, ratings, &used_ratings, config)
        else {
            continue;
        };

        used_names[idx] = true;
        used_ratings[rating_idx] = true;

        let rating = &ratings[rating_idx];
        let mut name = names[idx].text.clone();
        let mut name_bounds = names[idx].bounds;

        if let Some(second_idx) =
            second_name_line(idx, names, &used_names, &rating.bounds, config)
        {
            used_names[second_idx] = true;
            name = format!("{} {}", name, names[second_idx].text);
            name_bounds = name_bounds.union(&names[second_idx].bounds);
        }

        pairs.push(NamedRating {
            name,
            name_bounds,
            rating: rating.text.clone(),
            rating_bounds: rating.bounds,
        });
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, center_x: f32, top: f32, width: f32) -> OcrToken {
        OcrToken::new(text, Quad::from_rect(center_x - width / 2.0, top, width, 16.0))
    }

    #[test]
    fn test_pairs_name_with_rating_below() {
        let names = vec![token("HULK", 100.0, 200.0, 40.0), token("THOR", 260.0, 200.0, 40.0)];
        let ratings = vec![token("45,678", 262.0, 220.0, 50.0), token("12,345", 101.0, 220.0, 50.0)];

        let pairs = pair_names_with_ratings(&names, &ratings, &GridConfig::default());
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].name.as_str(), pairs[0].rating.as_str()), ("HULK", "12,345"));
        assert_eq!((pairs[1].name.as_str(), pairs[1].rating.as_str()), ("THOR", "45,678"));
    }

    #[test]
    fn test_rating_above_name_is_ignored() {
        let names = vec![token("HULK", 100.0, 200.0, 40.0)];
        let ratings = vec![token("12,345", 100.0, 150.0, 50.0)];
        assert!(pair_names_with_ratings(&names, &ratings, &GridConfig::default()).is_empty());
    }

    #[test]
    fn test_rating_too_far_sideways_is_ignored() {
        let names = vec![token("HULK", 100.0, 200.0, 40.0)];
        let ratings = vec![token("12,345", 200.0, 220.0, 50.0)];
        assert!(pair_names_with_ratings(&names, &ratings, &GridConfig::default()).is_empty());
    }

    #[test]
    fn test_ratings_are_consumed_once() {
        // Both names are within reach of the single rating; the first one takes it
        let names = vec![token("HULK", 100.0, 140.0, 40.0), token("THOR", 140.0, 140.0, 40.0)];
        let ratings = vec![token("12,345", 120.0, 170.0, 50.0)];
        let pairs = pair_names_with_ratings(&names, &ratings, &GridConfig::default());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "HULK");
    }

    #[test]
    fn test_two_line_name_is_absorbed() {
        let names = vec![
            token("CAPTAIN", 100.0, 180.0, 70.0),
            token("THOR", 260.0, 200.0, 40.0),
            token("AMERICA", 101.0, 200.0, 70.0),
        ];
        let ratings = vec![token("12,345", 100.0, 222.0, 50.0), token("45,678", 260.0, 222.0, 50.0)];

        let pairs = pair_names_with_ratings(&names, &ratings, &GridConfig::default());
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].name, "CAPTAIN AMERICA");
        assert_eq!(pairs[0].rating, "12,345");
        assert_eq!(pairs[0].name_bounds.top(), 180.0);
        assert_eq!(pairs[0].name_bounds.bottom(), 216.0);
        assert_eq!(pairs[1].name, "THOR");
    }

    #[test]
    fn test_centroid_spans_name_and_rating() {
        let pair = NamedRating {
            name: "HULK".to_string(),
            name_bounds: Quad::from_rect(80.0, 200.0, 40.0, 16.0),
            rating: "12,345".to_string(),
            rating_bounds: Quad::from_rect(75.0, 220.0, 50.0, 16.0),
        };
        assert_eq!(pair.centroid(), Point::new(100.0, 218.0));
    }
}
