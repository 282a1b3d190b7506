// Kept in sync with `SqliteStore::init_schema`.

diesel::table! {
    products (id) {
        id -> Text,
        user_id -> Text,
        product_name -> Text,
        target_price -> Double,
        created_at -> Text,
        alert_enabled -> Integer,
    }
}

diesel::table! {
    price_history (id) {
        id -> Text,
        product_id -> Text,
        retailer -> Text,
        price -> Double,
        url -> Text,
        checked_at -> Text,
    }
}

diesel::table! {
    alerts (id) {
        id -> Text,
        product_id -> Text,
        alert_type -> Text,
        message -> Text,
        created_at -> Text,
        read -> Integer,
    }
}

diesel::joinable!(price_history -> products (product_id));
diesel::joinable!(alerts -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(products, price_history, alerts,);
