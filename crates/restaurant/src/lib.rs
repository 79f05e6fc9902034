use rand::Rng;

use common::{Activity, Source};

const RESTAURANTS: [&str; 2] = ["全美自助餐", "素怡園"];
const TITLE_PREFIX: &str = "中午吃";
const PROMO_IMAGE_URL: &str =
    "https://img.shoplineapp.com/media/image_clips/64ef01e8c27149001420b87e/original.jpg?1693385191";

/// Build the synthetic lunch activity. No fetch involved and no link;
/// identity derives from the title alone, so picking the same restaurant
/// twice dedups to one stored record.
pub fn generate() -> Activity {
    let pick = rand::thread_rng().gen_range(0..RESTAURANTS.len());
    activity_for(RESTAURANTS[pick])
}

fn activity_for(name: &str) -> Activity {
    Activity::new(
        format!("{}{}", TITLE_PREFIX, name),
        None,
        Source::Restaurant,
        Some(PROMO_IMAGE_URL.to_string()),
    )
}
