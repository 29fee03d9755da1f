//! Axum용 인증 미들웨어와 역할 검사.
//!
//! 요청 처리 흐름: `Unauthenticated -> Authenticated -> Authorized`
//!
//! 1. [`authenticate`]: Bearer 토큰 검증 후 [`AuthContext`]를 request extension에 저장
//! 2. [`require_role`] 미들웨어 또는 [`Authorized`] 추출기: 역할 집합 검사 (403)
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/users", get(list_users))
//!     .route_layer(middleware::from_fn(require_role(ADMIN_ONLY)))
//!     .route_layer(middleware::from_fn_with_state(codec, authenticate));
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use acdash_core::Role;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;

use super::jwt::{extract_bearer, TokenCodec, TokenKind};
use crate::error::ApiError;

/// 관리자 전용.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
/// 관리자 + 기술자.
pub const STAFF: &[Role] = &[Role::Admin, Role::Technician];
/// 인증된 모든 역할.
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Technician, Role::Customer];

/// 인증된 호출자 정보 (요청 단위).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: i64,
    pub email: String,
    pub role: Role,
}

/// Authorization 헤더 값으로 호출자를 인증합니다.
///
/// refresh 토큰은 API 자격증명으로 쓸 수 없습니다.
pub fn authenticate_header(
    codec: &TokenCodec,
    header: Option<&str>,
) -> Result<AuthContext, ApiError> {
    let header = header.ok_or(ApiError::MissingAuthHeader)?;
    let token = extract_bearer(header)?;
    let claims = codec.validate(token)?;

    if claims.sub != TokenKind::Access {
        return Err(ApiError::InvalidTokenType);
    }

    Ok(AuthContext {
        account_id: claims.user_id,
        email: claims.email,
        role: claims.role,
    })
}

/// 인증 미들웨어.
///
/// `middleware::from_fn_with_state(codec, authenticate)`로 등록합니다.
pub async fn authenticate(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| ApiError::MalformedAuthHeader)?),
        None => None,
    };

    let context = match authenticate_header(&codec, header) {
        Ok(context) => context,
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), error = %e, "인증 실패");
            return Err(e);
        }
    };

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// 호출자 역할이 허용 집합에 속하는지 검사합니다.
pub fn authorize(context: &AuthContext, allowed: &[Role]) -> Result<(), ApiError> {
    verdict(context, allowed.contains(&context.role))
}

fn verdict(context: &AuthContext, permitted: bool) -> Result<(), ApiError> {
    if permitted {
        return Ok(());
    }
    tracing::warn!(
        account_id = context.account_id,
        role = %context.role,
        "권한 부족으로 요청 거부"
    );
    Err(ApiError::Forbidden)
}

/// 역할 검사 미들웨어 생성자.
///
/// [`authenticate`] 뒤에 실행되어야 합니다 (`route_layer` 순서상 먼저 등록).
pub fn require_role(
    allowed: &'static [Role],
) -> impl Fn(Request, Next) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let verdict = match request.extensions().get::<AuthContext>() {
                Some(context) => authorize(context, allowed),
                None => Err(ApiError::MissingAuthHeader),
            };

            match verdict {
                Ok(()) => next.run(request).await,
                Err(e) => e.into_response(),
            }
        })
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(ApiError::MissingAuthHeader)
    }
}

/// 핸들러 단위 역할 정책.
///
/// `permits`는 모든 역할을 와일드카드 없이 match 합니다.
pub trait RolePolicy: Send + Sync + 'static {
    /// `require_role` 미들웨어에 넘길 허용 집합.
    const ALLOWED: &'static [Role];

    fn permits(role: Role) -> bool;
}

/// 관리자 전용 정책.
pub struct AdminOnly;

impl RolePolicy for AdminOnly {
    const ALLOWED: &'static [Role] = ADMIN_ONLY;

    fn permits(role: Role) -> bool {
        match role {
            Role::Admin => true,
            Role::Technician | Role::Customer => false,
        }
    }
}

/// 관리자 + 기술자 정책.
pub struct Staff;

impl RolePolicy for Staff {
    const ALLOWED: &'static [Role] = STAFF;

    fn permits(role: Role) -> bool {
        match role {
            Role::Admin | Role::Technician => true,
            Role::Customer => false,
        }
    }
}

/// 인증된 모든 역할 허용.
pub struct AnyRole;

impl RolePolicy for AnyRole {
    const ALLOWED: &'static [Role] = ANY_ROLE;

    fn permits(role: Role) -> bool {
        match role {
            Role::Admin | Role::Technician | Role::Customer => true,
        }
    }
}

/// 정책 `P`를 통과한 호출자 추출기.
///
/// ```rust,ignore
/// async fn delete_customer(auth: Authorized<AdminOnly>, ...) -> ApiResult<...>
/// ```
pub struct Authorized<P: RolePolicy> {
    pub context: AuthContext,
    _policy: PhantomData<P>,
}

impl<P: RolePolicy> Authorized<P> {
    pub fn context(&self) -> &AuthContext {
        &self.context
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = AuthContext::from_request_parts(parts, state).await?;
        verdict(&context, P::permits(context.role))?;
        Ok(Authorized {
            context,
            _policy: PhantomData,
        })
    }
}
