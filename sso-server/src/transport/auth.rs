use sso_core::AuthService;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::debug;

use super::{
    status::{auth_status, lookup_status},
    validation,
};
use crate::pb::{
    IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse,
    RegisterRequest, RegisterResponse,
    auth_server::{Auth, AuthServer},
};

/// `auth.Auth` handler. Stateless apart from the shared service.
#[derive(Debug, Clone)]
pub struct AuthGrpcService {
    service: Arc<AuthService>,
}

impl AuthGrpcService {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }

    pub fn into_server(self) -> AuthServer<Self> {
        AuthServer::new(self)
    }
}

#[tonic::async_trait]
impl Auth for AuthGrpcService {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();
        let email = validation::validate_register(&req)?;
        debug!(email = %email, "register request");

        let id = self
            .service
            .register(&email, &req.password)
            .await
            .map_err(auth_status)?;

        Ok(Response::new(RegisterResponse { user_id: id.get() }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();
        let valid = validation::validate_login(&req)?;
        debug!(email = %valid.email, app_id = %valid.app_id, "login request");

        let token = self
            .service
            .login(&valid.email, &req.password, valid.app_id)
            .await
            .map_err(|err| lookup_status(err, "application not found"))?;

        Ok(Response::new(LoginResponse { token }))
    }

    async fn is_admin(
        &self,
        request: Request<IsAdminRequest>,
    ) -> Result<Response<IsAdminResponse>, Status> {
        let identity_id = validation::validate_is_admin(request.get_ref())?;

        let is_admin = self
            .service
            .is_admin(identity_id)
            .await
            .map_err(|err| lookup_status(err, "user not found"))?;

        Ok(Response::new(IsAdminResponse { is_admin }))
    }
}
