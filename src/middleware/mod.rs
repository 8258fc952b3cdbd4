/*
 * Responsibility
 * - middleware の公開インターフェース
 * - http: request id / trace / limits, auth: API token authentication
 */
pub mod auth;
pub mod http;
