diesel::table! {
    favorites (id) {
        id -> Int8,
        user_id -> Int8,
        recipe_id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    images (id) {
        id -> Int8,
        recipe_id -> Int8,
        url -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    profiles (id) {
        id -> Int8,
        user_id -> Int8,
        full_name -> Varchar,
        bio -> Text,
        avatar_url -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    recipe_tags (recipe_id, tag_id) {
        recipe_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    recipes (id) {
        id -> Int8,
        user_id -> Int8,
        title -> Varchar,
        description -> Text,
        ingredients -> Text,
        instructions -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    reviews (id) {
        id -> Int8,
        user_id -> Int8,
        recipe_id -> Int8,
        content -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tags (id) {
        id -> Int8,
        name -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(favorites -> recipes (recipe_id));
diesel::joinable!(favorites -> users (user_id));
diesel::joinable!(images -> recipes (recipe_id));
diesel::joinable!(profiles -> users (user_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipes -> users (user_id));
diesel::joinable!(reviews -> recipes (recipe_id));
diesel::joinable!(reviews -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    favorites,
    images,
    profiles,
    recipe_tags,
    recipes,
    reviews,
    tags,
    users,
);
