use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use super::carrier::request_carrier;
use super::middleware::{AdminAuthenticated, Authenticated, error_status};
use crate::actions::{
    AdminOverviewAction, CreateUserAction, CreateUserInput, DeleteUserAction,
    ForgotPasswordAction, LoginAction, LogoutAction, PresetError, PresetsAction,
    RESET_REQUESTED_MESSAGE, ResetPasswordAction, RunAnalysisAction,
    UpdateContractStatusAction, ValidateResetTokenAction,
};
use crate::api::{
    AnalysisRequest, CreateUserRequest, CreatedResponse, DashboardResponse, ErrorResponse,
    ForgotPasswordRequest, LoginRequest, MessageResponse, ResetLinkQuery, ResetLinkResponse,
    ResetPasswordRequest, SavePresetRequest, SessionResponse, UpdateStatusRequest,
};
use crate::collector::{Analyst, CollectorError, CollectorPreset, MarketDataSource};
use crate::config::ResetConfig;
use crate::gate::{self, Route};
use crate::mailer::ResetMailer;
use crate::session::SessionConfig;
use crate::{AuthError, PresetRepository, UserRepository};

fn see_other(route: Route) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, route.path()))
        .finish()
}

fn auth_error(err: AuthError) -> HttpResponse {
    HttpResponse::build(error_status(&err)).json(ErrorResponse::from(err))
}

fn preset_error(err: PresetError) -> HttpResponse {
    let status = match &err {
        PresetError::InvalidName(_) => StatusCode::BAD_REQUEST,
        PresetError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PresetError::NotFound => StatusCode::NOT_FOUND,
        PresetError::Store(err) => error_status(err),
    };
    HttpResponse::build(status).json(ErrorResponse::from(err))
}

fn collector_error(err: CollectorError) -> HttpResponse {
    let status = if err.is_external() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    HttpResponse::build(status).json(ErrorResponse::from(err))
}

// Login and logout

pub async fn login_page(req: HttpRequest, config: web::Data<SessionConfig>) -> HttpResponse {
    let carrier = match request_carrier(&req, &config) {
        Ok(carrier) => carrier,
        Err(err) => return auth_error(err),
    };
    match gate::redirect_if_authenticated(&carrier, Utc::now().timestamp()) {
        Some(route) => see_other(route),
        None => HttpResponse::Ok().json(MessageResponse::new("Sign in to continue")),
    }
}

pub async fn login<U>(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    user_repo: web::Data<U>,
    config: web::Data<SessionConfig>,
) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
{
    let carrier = match request_carrier(&req, &config) {
        Ok(carrier) => carrier,
        Err(err) => return auth_error(err),
    };
    let action = LoginAction::new(user_repo.get_ref().clone(), config.get_ref().clone());

    let result = action.execute(&carrier, &body.email, &body.password).await;

    // success and failure both rewrite the carrier
    let mut builder = match &result {
        Ok(_) => HttpResponse::Ok(),
        Err(err) => HttpResponse::build(error_status(err)),
    };
    carrier.inner().apply(&mut builder, &config);

    match result {
        Ok(session) => builder.json(SessionResponse::from(&session)),
        Err(err) => builder.json(ErrorResponse::from(err)),
    }
}

pub async fn logout(req: HttpRequest, config: web::Data<SessionConfig>) -> HttpResponse {
    let carrier = match request_carrier(&req, &config) {
        Ok(carrier) => carrier,
        Err(err) => return auth_error(err),
    };

    match LogoutAction::new().execute(&carrier).await {
        Ok(route) => {
            let mut builder = HttpResponse::SeeOther();
            carrier.inner().apply(&mut builder, &config);
            builder
                .insert_header((header::LOCATION, route.path()))
                .finish()
        }
        Err(err) => auth_error(err),
    }
}

// Dashboard

pub async fn dashboard<P>(auth: Authenticated, preset_repo: web::Data<P>) -> HttpResponse
where
    P: PresetRepository + Clone + 'static,
{
    let session = auth.session();
    match PresetsAction::new(preset_repo.get_ref().clone())
        .list(session)
        .await
    {
        Ok(presets) => HttpResponse::Ok().json(DashboardResponse::new(session, presets)),
        Err(err) => preset_error(err),
    }
}

pub async fn list_presets<P>(auth: Authenticated, preset_repo: web::Data<P>) -> HttpResponse
where
    P: PresetRepository + Clone + 'static,
{
    match PresetsAction::new(preset_repo.get_ref().clone())
        .list(auth.session())
        .await
    {
        Ok(presets) => HttpResponse::Ok().json(presets),
        Err(err) => preset_error(err),
    }
}

pub async fn save_preset<P>(
    auth: Authenticated,
    body: web::Json<SavePresetRequest>,
    preset_repo: web::Data<P>,
) -> HttpResponse
where
    P: PresetRepository + Clone + 'static,
{
    match PresetsAction::new(preset_repo.get_ref().clone())
        .save(auth.session(), &body.name, &body.config)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Preset saved")),
        Err(err) => preset_error(err),
    }
}

pub async fn delete_preset<P>(
    auth: Authenticated,
    path: web::Path<String>,
    preset_repo: web::Data<P>,
) -> HttpResponse
where
    P: PresetRepository + Clone + 'static,
{
    match PresetsAction::new(preset_repo.get_ref().clone())
        .delete(auth.session(), &path)
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => preset_error(err),
    }
}

/// Runs the collector for a saved preset, an inline configuration or the
/// defaults, in that order of preference.
pub async fn run_analysis<P, S, A>(
    auth: Authenticated,
    body: Option<web::Json<AnalysisRequest>>,
    preset_repo: web::Data<P>,
    source: web::Data<S>,
    analyst: web::Data<A>,
) -> HttpResponse
where
    P: PresetRepository + Clone + 'static,
    S: MarketDataSource + Clone + 'static,
    A: Analyst + Clone + 'static,
{
    let session = auth.session();
    let request = body.map(web::Json::into_inner).unwrap_or_default();

    let config = match (request.preset, request.config) {
        (Some(name), _) => match PresetsAction::new(preset_repo.get_ref().clone())
            .find(session, &name)
            .await
        {
            Ok(preset) => preset.config,
            Err(err) => return preset_error(err),
        },
        (None, Some(config)) => config,
        (None, None) => CollectorPreset::default(),
    };

    let action = RunAnalysisAction::new(source.get_ref().clone(), analyst.get_ref().clone());
    match action.execute(session, &config).await {
        Ok(run) => HttpResponse::Ok().json(run),
        Err(err) => {
            log::warn!(target: "rdx_dash::collector", "msg=\"analysis failed\" user_id={} error=\"{err}\"", session.user_id);
            collector_error(err)
        }
    }
}

// Admin

pub async fn admin_overview<U>(auth: AdminAuthenticated, user_repo: web::Data<U>) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
{
    match AdminOverviewAction::new(user_repo.get_ref().clone())
        .execute(auth.session())
        .await
    {
        Ok(overview) => HttpResponse::Ok().json(overview),
        Err(err) => auth_error(err),
    }
}

pub async fn create_user<U>(
    auth: AdminAuthenticated,
    body: web::Json<CreateUserRequest>,
    user_repo: web::Data<U>,
) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
{
    let body = body.into_inner();
    let input = CreateUserInput {
        name: body.name,
        email: body.email,
        password: body.password,
        contract_status: body.contract_status,
    };

    match CreateUserAction::new(user_repo.get_ref().clone())
        .execute(auth.session(), input)
        .await
    {
        Ok(id) => HttpResponse::Created().json(CreatedResponse { id }),
        Err(err) => auth_error(err),
    }
}

pub async fn update_user_status<U>(
    auth: AdminAuthenticated,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
    user_repo: web::Data<U>,
) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
{
    match UpdateContractStatusAction::new(user_repo.get_ref().clone())
        .execute(auth.session(), &path, body.status)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Contract status updated")),
        Err(err) => auth_error(err),
    }
}

pub async fn delete_user<U>(
    auth: AdminAuthenticated,
    path: web::Path<String>,
    user_repo: web::Data<U>,
) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
{
    match DeleteUserAction::new(user_repo.get_ref().clone())
        .execute(auth.session(), &path)
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => auth_error(err),
    }
}

// Password reset

/// Answers the same way whether or not the email is registered.
pub async fn forgot_password<U, M>(
    body: web::Json<ForgotPasswordRequest>,
    user_repo: web::Data<U>,
    mailer: web::Data<M>,
    reset_config: web::Data<ResetConfig>,
) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
    M: ResetMailer + Clone + 'static,
{
    let action = ForgotPasswordAction::with_config(
        user_repo.get_ref().clone(),
        mailer.get_ref().clone(),
        reset_config.get_ref().clone(),
    );

    match action.execute(&body.email).await {
        Ok(_) => HttpResponse::Ok().json(MessageResponse::new(RESET_REQUESTED_MESSAGE)),
        Err(err) => auth_error(err),
    }
}

pub async fn reset_password_page<U>(
    query: web::Query<ResetLinkQuery>,
    user_repo: web::Data<U>,
) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
{
    match ValidateResetTokenAction::new(user_repo.get_ref().clone())
        .execute(&query.email, &query.token)
        .await
    {
        Ok(user) => HttpResponse::Ok().json(ResetLinkResponse {
            email: user.email,
            valid: true,
        }),
        Err(err) => auth_error(err),
    }
}

pub async fn reset_password<U>(
    body: web::Json<ResetPasswordRequest>,
    user_repo: web::Data<U>,
) -> HttpResponse
where
    U: UserRepository + Clone + 'static,
{
    match ResetPasswordAction::new(user_repo.get_ref().clone())
        .execute(
            &body.email,
            &body.token,
            &body.password,
            &body.password_confirmation,
        )
        .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new(
            "Your password has been reset, you can now sign in",
        )),
        Err(err) => auth_error(err),
    }
}
