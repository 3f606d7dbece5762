pub mod store {

    pub const APP_IDENTIFIER: &str = "com.aszeromo.smarticafe";

    pub const DATABASE_FILE_NAME: &str = "smarticafe.db";

    pub const BUSY_TIMEOUT_SECS: u64 = 5;
}

pub mod roles {

    pub const ADMIN: &str = "admin";

    pub const STAFF: &str = "staff";
}

pub mod seed {

    pub const ADMIN_LOGIN_NAME: &str = "admin";

    pub const ADMIN_DISPLAY_NAME: &str = "超级管理员";

    pub const ADMIN_IDENTITY: &str = "admin";

    pub const BRAND_NAME_KEY: &str = "brand_name";

    pub const STORE_NAME_KEY: &str = "store_name";

    pub const BRAND_NAME: &str = "创新意电竞";

    pub const STORE_NAME: &str = "广州总店";
}

/// Shown when a store predates the brand settings.
pub mod fallback {

    pub const BRAND_NAME: &str = "我的电竞馆";

    pub const STORE_NAME: &str = "总店";
}

pub mod env {

    pub const ADMIN_PASSWORD: &str = "FIRSTRUN_ADMIN_PASSWORD";
}
