//! Restaurants seeded into an empty store.

use rust_decimal::Decimal;

use crate::domain::{MenuItem, Restaurant, VerificationStatus};

fn item(id: &str, name: &str, description: &str, cents: i64, image: u32, category: &str) -> MenuItem {
    MenuItem::new(id, name, Decimal::new(cents, 2), category)
        .with_description(description)
        .with_image(format!("https://picsum.photos/200/200?random={}", image))
}

fn storefront(
    id: &str,
    name: &str,
    image: u32,
    rating: f64,
    delivery_time: &str,
    categories: &[&str],
    menu: Vec<MenuItem>,
) -> Restaurant {
    let mut restaurant = Restaurant::new(id, name)
        .with_delivery_time(delivery_time)
        .with_menu(menu);
    restaurant.image = format!("https://picsum.photos/400/300?random={}", image);
    restaurant.rating = rating;
    restaurant.categories = categories.iter().map(|c| c.to_string()).collect();
    restaurant.is_verified = VerificationStatus::Approved;
    restaurant
}

pub fn default_restaurants() -> Vec<Restaurant> {
    vec![
        storefront(
            "r1",
            "Blade & Burger",
            1,
            4.8,
            "25-35 min",
            &["Burgers", "American"],
            vec![
                item("m1", "The Sledgehammer", "Double beef patty, smoked bacon, cheddar, BBQ sauce.", 1499, 11, "Burgers"),
                item("m2", "Steel Cut Fries", "Thick cut fries with sea salt and rosemary.", 599, 12, "Sides"),
            ],
        ),
        storefront(
            "r2",
            "Iron Wok",
            2,
            4.5,
            "30-45 min",
            &["Asian", "Stir Fry"],
            vec![
                item("m3", "Spicy Beef Basil", "Wok-seared beef with thai basil and chili.", 1650, 13, "Mains"),
                item("m4", "Dumplings of Fury", "Steamed pork dumplings with chili oil.", 900, 14, "Appetizers"),
            ],
        ),
        storefront(
            "r3",
            "Timber Pizza Co.",
            3,
            4.9,
            "40-50 min",
            &["Pizza", "Italian"],
            vec![
                item("m5", "Woodsman Special", "Mushrooms, truffle oil, mozzarella, thyme.", 1800, 15, "Pizza"),
                item("m6", "Red Axe Pepperoni", "Spicy pepperoni, red onions, hot honey.", 1750, 16, "Pizza"),
            ],
        ),
    ]
}
