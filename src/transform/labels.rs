//! Training labels: expert ratings and rating categories.

use crate::error::Result;
use crate::extract::{DriverCategoryRow, DriverRatingRow};
use crate::storage::{DriverCategory, DriverRating};

pub fn driver_ratings(rows: Vec<DriverRatingRow>) -> impl Iterator<Item = Result<DriverRating>> {
    rows.into_iter().zip(1..).map(|(row, id)| {
        Ok(DriverRating {
            id,
            driver_id: row.driver_id,
            year: row.year,
            rating: row.rating,
        })
    })
}

pub fn driver_categories(
    rows: Vec<DriverCategoryRow>,
) -> impl Iterator<Item = Result<DriverCategory>> {
    rows.into_iter().zip(1..).map(|(row, id)| {
        Ok(DriverCategory {
            id,
            driver_id: row.driver_id,
            year: row.year,
            category: row.category,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_numbered_in_order() {
        let ratings: Vec<DriverRating> = driver_ratings(vec![
            DriverRatingRow {
                driver_id: 1,
                year: 2019,
                rating: 9.2,
            },
            DriverRatingRow {
                driver_id: 822,
                year: 2019,
                rating: 8.1,
            },
        ])
        .collect::<Result<_>>()
        .unwrap();
        assert_eq!(ratings[1].id, 2);
        assert_eq!(ratings[1].driver_id, 822);

        let categories: Vec<DriverCategory> = driver_categories(vec![DriverCategoryRow {
            driver_id: 1,
            year: 2019,
            category: 3,
        }])
        .collect::<Result<_>>()
        .unwrap();
        assert_eq!(categories[0].id, 1);
        assert_eq!(categories[0].category, 3);
    }
}
