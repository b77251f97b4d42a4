// pit schema - project/task tables and the action log for Diesel ORM

diesel::table! {
    schema_versions (id) {
        id -> Integer,
        version -> Text,
        name -> Text,
        features -> Text,
        introduced_at -> Text,
    }
}

// One row per record table: id counter and current mark
diesel::table! {
    table_meta (name) {
        name -> Text,
        last_id -> Integer,
        current_id -> Integer,
    }
}

diesel::table! {
    projects (id) {
        id -> Integer,
        name -> Text,
        status -> Text,
        username -> Text,
        number_of_tasks -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    tasks (id) {
        id -> Integer,
        project_id -> Integer,     // FK to projects
        name -> Text,
        status -> Text,
        priority -> Text,
        date -> Nullable<Text>,    // YYYY-MM-DD
        username -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    actions (id) {
        id -> Integer,
        project_id -> Integer,
        task_id -> Integer,        // 0 when not task specific
        username -> Text,
        message -> Text,
        created_at -> Text,
    }
}
