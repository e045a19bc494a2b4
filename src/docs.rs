// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Hardware ---
        handlers::hardware::submit_deposit,
        handlers::hardware::check_user,
        handlers::hardware::register_user,

        // --- Profiles ---
        handlers::profiles::signup,
        handlers::profiles::get_me,
        handlers::profiles::get_history,
        handlers::profiles::get_leaderboard,

        // --- Withdrawals ---
        handlers::withdrawals::request_withdrawal,
        handlers::withdrawals::list_withdrawals,
        handlers::withdrawals::resolve_withdrawal,

        // --- Locations ---
        handlers::locations::list_locations,
        handlers::locations::list_company_locations,
        handlers::locations::create_company_location,
        handlers::locations::update_company_location,
        handlers::locations::delete_company_location,
        handlers::locations::admin_create_location,
        handlers::locations::admin_update_location,
        handlers::locations::admin_delete_location,

        // --- Companies ---
        handlers::companies::register_company,
        handlers::companies::get_my_company,
        handlers::companies::update_my_settings,
        handlers::companies::admin_register_company,
        handlers::companies::admin_list_companies,

        // --- Portal ---
        handlers::portal::get_portal,
        handlers::portal::submit_company_deposit,
        handlers::portal::request_company_withdrawal,

        // --- Admin ---
        handlers::dashboard::get_stats,
        handlers::dashboard::list_transactions,
    ),
    components(
        schemas(
            // --- Profiles ---
            models::profile::Profile,
            models::profile::UniqueCodePayload,
            models::profile::SignupPayload,
            models::profile::CheckUserResponse,
            models::profile::RegisterUserResponse,
            models::profile::MeResponse,
            models::profile::LeaderboardEntry,

            // --- Deposits ---
            models::deposit::WasteType,
            models::deposit::WasteTransaction,
            models::deposit::DepositPayload,
            models::deposit::DepositUser,
            models::deposit::DepositResult,
            models::deposit::DepositResponse,

            // --- Locations ---
            models::location::LocationStatus,
            models::location::Location,
            models::location::LocationState,
            models::location::CreateLocationPayload,
            models::location::UpdateLocationPayload,

            // --- Withdrawals ---
            models::withdrawal::WithdrawalStatus,
            models::withdrawal::WithdrawalOutcome,
            models::withdrawal::Withdrawal,
            models::withdrawal::WithdrawalReceipt,
            models::withdrawal::WithdrawalPayload,
            models::withdrawal::ResolveWithdrawalPayload,

            // --- Companies ---
            models::company::Company,
            models::company::CompanySettings,
            models::company::RegisterCompanyPayload,
            models::company::PortalView,

            // --- Dashboard ---
            models::dashboard::AdminStats,
            models::dashboard::AdminTransactionRow,
            models::dashboard::AdminWithdrawalRow,
            models::dashboard::HistoryResponse,
        )
    ),
    tags(
        (name = "Health", description = "Verificação do serviço"),
        (name = "Hardware", description = "Rotas das lixeiras inteligentes"),
        (name = "Profiles", description = "Contas, saldo e ranking"),
        (name = "Withdrawals", description = "Saques em Naira"),
        (name = "Locations", description = "Pontos de coleta"),
        (name = "Companies", description = "Empresas parceiras"),
        (name = "Portal", description = "Portal público da empresa"),
        (name = "Admin", description = "Painel administrativo")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_surface() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/hardware/deposits",
            "/api/portal/{slug}/withdrawals",
            "/api/admin/withdrawals/{id}/resolve",
            "/api/companies/me/locations/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }
}
