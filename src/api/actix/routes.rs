use actix_web::web;

use super::handlers::{
    admin_overview, create_user, dashboard, delete_preset, delete_user, forgot_password,
    list_presets, login, login_page, logout, reset_password, reset_password_page, run_analysis,
    save_preset, update_user_status,
};
use crate::collector::{Analyst, MarketDataSource};
use crate::mailer::ResetMailer;
use crate::{PresetRepository, UserRepository};

/// Public pages: sign-in, sign-out and password reset.
///
/// - `GET /login`, `POST /login`
/// - `POST /logout`
/// - `POST /forgot-password`
/// - `GET /reset-password`, `POST /reset-password`
///
/// Needs `web::Data<U>`, `web::Data<M>`, `web::Data<SessionConfig>` and
/// `web::Data<ResetConfig>` registered on the app.
pub fn auth_routes<U, M>(cfg: &mut web::ServiceConfig)
where
    U: UserRepository + Clone + 'static,
    M: ResetMailer + Clone + 'static,
{
    cfg.route("/login", web::get().to(login_page))
        .route("/login", web::post().to(login::<U>))
        .route("/logout", web::post().to(logout))
        .route("/forgot-password", web::post().to(forgot_password::<U, M>))
        .route("/reset-password", web::get().to(reset_password_page::<U>))
        .route("/reset-password", web::post().to(reset_password::<U>));
}

/// Pages behind the authorization gate.
///
/// - `GET /dashboard`
/// - `POST /dashboard/analysis`
/// - `GET /dashboard/presets`, `POST /dashboard/presets`
/// - `DELETE /dashboard/presets/{name}`
pub fn dashboard_routes<P, S, A>(cfg: &mut web::ServiceConfig)
where
    P: PresetRepository + Clone + 'static,
    S: MarketDataSource + Clone + 'static,
    A: Analyst + Clone + 'static,
{
    cfg.service(
        web::scope("/dashboard")
            .route("", web::get().to(dashboard::<P>))
            .route("/analysis", web::post().to(run_analysis::<P, S, A>))
            .route("/presets", web::get().to(list_presets::<P>))
            .route("/presets", web::post().to(save_preset::<P>))
            .route("/presets/{name}", web::delete().to(delete_preset::<P>)),
    );
}

/// Pages behind the authorization gate and the role gate.
///
/// - `GET /admin`
/// - `POST /admin/users`
/// - `PUT /admin/users/{email}/status`
/// - `DELETE /admin/users/{email}`
pub fn admin_routes<U>(cfg: &mut web::ServiceConfig)
where
    U: UserRepository + Clone + 'static,
{
    cfg.service(
        web::scope("/admin")
            .route("", web::get().to(admin_overview::<U>))
            .route("/users", web::post().to(create_user::<U>))
            .route("/users/{email}/status", web::put().to(update_user_status::<U>))
            .route("/users/{email}", web::delete().to(delete_user::<U>)),
    );
}

/// Every page of the dashboard.
///
/// # Example
///
/// ```rust,ignore
/// use rdx_dash::api::actix::dashboard_app;
///
/// App::new()
///     .app_data(web::Data::new(user_repo))
///     .app_data(web::Data::new(preset_repo))
///     .app_data(web::Data::new(mailer))
///     .app_data(web::Data::new(source))
///     .app_data(web::Data::new(analyst))
///     .app_data(web::Data::new(session_config))
///     .app_data(web::Data::new(reset_config))
///     .configure(dashboard_app::<UserRepo, PresetRepo, Mailer, Source, Analyst>)
/// ```
pub fn dashboard_app<U, P, M, S, A>(cfg: &mut web::ServiceConfig)
where
    U: UserRepository + Clone + 'static,
    P: PresetRepository + Clone + 'static,
    M: ResetMailer + Clone + 'static,
    S: MarketDataSource + Clone + 'static,
    A: Analyst + Clone + 'static,
{
    cfg.configure(auth_routes::<U, M>)
        .configure(dashboard_routes::<P, S, A>)
        .configure(admin_routes::<U>);
}
