use bson::oid::ObjectId;
use bson::Bson;
use camp_query::FilterGroup;
use camp_store::{DocumentStore, MeanRollup};

use crate::error::ApiError;
use crate::models::{BOOTCAMPS, COURSES, REVIEWS};

/// Mean tuition rounded up to the next multiple of ten.
pub fn average_cost(mean_tuition: f64) -> i64 {
    ((mean_tuition / 10.0).ceil() * 10.0) as i64
}

/// Mean rating rounded to one decimal.
pub fn average_rating(mean_rating: f64) -> f64 {
    (mean_rating * 10.0).round() / 10.0
}

/// Refresh `averageCost` on a bootcamp from its remaining courses.
pub fn recompute_average_cost(store: &dyn DocumentStore, bootcamp: ObjectId) -> Result<(), ApiError> {
    roll_up(store, bootcamp, COURSES, "tuition", "averageCost", &|m: f64| {
        Bson::Int64(average_cost(m))
    })
}

/// Refresh `averageRating` on a bootcamp from its remaining reviews.
pub fn recompute_average_rating(store: &dyn DocumentStore, bootcamp: ObjectId) -> Result<(), ApiError> {
    roll_up(store, bootcamp, REVIEWS, "rating", "averageRating", &|m: f64| {
        Bson::Double(average_rating(m))
    })
}

fn children_of(bootcamp: ObjectId) -> FilterGroup {
    FilterGroup::eq("bootcamp", bootcamp)
}

fn roll_up(
    store: &dyn DocumentStore,
    bootcamp: ObjectId,
    source: &str,
    field: &str,
    target_field: &str,
    finish: &dyn Fn(f64) -> Bson,
) -> Result<(), ApiError> {
    let filter = children_of(bootcamp);
    let rollup = MeanRollup {
        source,
        filter: &filter,
        field,
        target: BOOTCAMPS,
        id: &bootcamp,
        target_field,
    };
    if store.roll_up_mean(rollup, finish)?.is_none() {
        tracing::debug!(bootcamp = %bootcamp, field = target_field, "bootcamp gone before recompute");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use bson::doc;
    use camp_store::MemoryStore;

    use crate::models::create_collections;

    #[test]
    fn rounding() {
        assert_eq!(average_cost(9000.0), 9000);
        assert_eq!(average_cost(9001.0), 9010);
        assert_eq!(average_cost(8333.33), 8340);
        assert_eq!(average_rating(7.25), 7.3);
        assert_eq!(average_rating(8.0), 8.0);
    }

    #[test]
    fn recompute_sets_and_unsets() {
        let store = MemoryStore::new();
        create_collections(&store).unwrap();
        let camp = store.insert_one(BOOTCAMPS, doc! { "name": "Devworks" }).unwrap();
        let id = camp.get_object_id("_id").unwrap();

        store
            .insert_one(COURSES, doc! { "tuition": 8000, "bootcamp": id })
            .unwrap();
        store
            .insert_one(COURSES, doc! { "tuition": 10005, "bootcamp": id })
            .unwrap();
        store
            .insert_one(COURSES, doc! { "tuition": 1, "bootcamp": ObjectId::new() })
            .unwrap();
        recompute_average_cost(&store, id).unwrap();
        let camp = store.find_by_id(BOOTCAMPS, &id).unwrap().unwrap();
        assert_eq!(camp.get_i64("averageCost").unwrap(), 9010);

        store
            .insert_one(REVIEWS, doc! { "rating": 8, "bootcamp": id, "user": ObjectId::new() })
            .unwrap();
        store
            .insert_one(REVIEWS, doc! { "rating": 7, "bootcamp": id, "user": ObjectId::new() })
            .unwrap();
        recompute_average_rating(&store, id).unwrap();
        let camp = store.find_by_id(BOOTCAMPS, &id).unwrap().unwrap();
        assert_eq!(camp.get_f64("averageRating").unwrap(), 7.5);

        store
            .delete_many(COURSES, Some(&FilterGroup::eq("bootcamp", id)))
            .unwrap();
        recompute_average_cost(&store, id).unwrap();
        let camp = store.find_by_id(BOOTCAMPS, &id).unwrap().unwrap();
        assert!(!camp.contains_key("averageCost"));
    }

    #[test]
    fn concurrent_course_writes_leave_current_average() {
        let store = Arc::new(MemoryStore::new());
        create_collections(store.as_ref()).unwrap();
        let camp = store.insert_one(BOOTCAMPS, doc! { "name": "Devworks" }).unwrap();
        let id = camp.get_object_id("_id").unwrap();

        for round in 0..200 {
            store.delete_many(COURSES, Some(&children_of(id))).unwrap();
            let writers: Vec<_> = (0..8)
                .map(|i| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        store
                            .insert_one(COURSES, doc! { "tuition": 1000 * (i + 1), "bootcamp": id })
                            .unwrap();
                        recompute_average_cost(store.as_ref(), id).unwrap();
                    })
                })
                .collect();
            for w in writers {
                w.join().unwrap();
            }

            let camp = store.find_by_id(BOOTCAMPS, &id).unwrap().unwrap();
            assert_eq!(camp.get_i64("averageCost").unwrap(), 4500, "round {round}");
        }
    }
}
