use serde::Deserialize;

/// Current state/municipality filter. Empty strings mean "unfiltered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    pub state: String,
    pub municipality: String,
}

impl FilterSelection {
    pub fn new(state: impl Into<String>, municipality: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            municipality: municipality.into(),
        }
    }

    /// The initial "show everything" selection.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Aggregate counts shown in the stats panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub client_count: u64,
    pub market_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub data: StatsData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub total_clients: u64,
    pub total_market: u64,
}

impl From<StatsResponse> for AggregateStats {
    fn from(resp: StatsResponse) -> Self {
        AggregateStats {
            client_count: resp.data.total_clients,
            market_count: resp.data.total_market,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MunicipalitiesResponse {
    pub municipios: Vec<String>,
}

/// Registry details of one company, looked up by CNPJ.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetail {
    pub razao_social: String,
    #[serde(default)]
    pub nome_fantasia: Option<String>,
    pub municipio: String,
    pub uf: String,
}

impl CompanyDetail {
    /// Trade name, treating a blank value as absent.
    pub fn trade_name(&self) -> Option<&str> {
        self.nome_fantasia
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Category value the company tiles use for existing clients.
pub const CLIENT_CATEGORY: &str = "cliente";

/// Identity of a clicked company point, taken from its tile properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRef {
    pub cnpj: String,
    pub tipo: String,
}

impl CompanyRef {
    pub fn is_client(&self) -> bool {
        self.tipo == CLIENT_CATEGORY
    }

    /// Category label as shown in the popup, e.g. "CLIENTE".
    pub fn category_label(&self) -> String {
        self.tipo.to_uppercase()
    }
}

/// Brazilian federative units offered by the state filter: (UF code, name).
pub const STATES: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AP", "Amapá"),
    ("AM", "Amazonas"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MT", "Mato Grosso"),
    ("MS", "Mato Grosso do Sul"),
    ("MG", "Minas Gerais"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PR", "Paraná"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RS", "Rio Grande do Sul"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("SC", "Santa Catarina"),
    ("SP", "São Paulo"),
    ("SE", "Sergipe"),
    ("TO", "Tocantins"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_deserializes() {
        let json = r#"{"data":{"totalClients":1234,"totalMarket":56}}"#;
        let resp: StatsResponse = serde_json::from_str(json).unwrap();
        let stats = AggregateStats::from(resp);
        assert_eq!(stats.client_count, 1234);
        assert_eq!(stats.market_count, 56);
    }

    #[test]
    fn test_stats_response_missing_data_fails() {
        let json = r#"{"totalClients":1}"#;
        assert!(serde_json::from_str::<StatsResponse>(json).is_err());
    }

    #[test]
    fn test_municipalities_response_deserializes() {
        let json = r#"{"municipios":["CAMPINAS","SANTOS","SÃO PAULO"]}"#;
        let resp: MunicipalitiesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.municipios.len(), 3);
        assert_eq!(resp.municipios[2], "SÃO PAULO");
    }

    #[test]
    fn test_company_detail_deserializes_with_trade_name() {
        let json = r#"{"razaoSocial":"ACME LTDA","nomeFantasia":"Acme","municipio":"CAMPINAS","uf":"SP"}"#;
        let detail: CompanyDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.razao_social, "ACME LTDA");
        assert_eq!(detail.trade_name(), Some("Acme"));
        assert_eq!(detail.uf, "SP");
    }

    #[test]
    fn test_company_detail_without_trade_name() {
        let json = r#"{"razaoSocial":"ACME LTDA","municipio":"CAMPINAS","uf":"SP"}"#;
        let detail: CompanyDetail = serde_json::from_str(json).unwrap();
        assert!(detail.nome_fantasia.is_none());
        assert!(detail.trade_name().is_none());
    }

    #[test]
    fn test_company_detail_null_or_blank_trade_name_is_absent() {
        let json = r#"{"razaoSocial":"X","nomeFantasia":null,"municipio":"Y","uf":"MG"}"#;
        let detail: CompanyDetail = serde_json::from_str(json).unwrap();
        assert!(detail.trade_name().is_none());

        let json = r#"{"razaoSocial":"X","nomeFantasia":"  ","municipio":"Y","uf":"MG"}"#;
        let detail: CompanyDetail = serde_json::from_str(json).unwrap();
        assert!(detail.trade_name().is_none());
    }

    #[test]
    fn test_company_ref_category_label() {
        let company = CompanyRef {
            cnpj: "11222333000144".to_string(),
            tipo: "cliente".to_string(),
        };
        assert!(company.is_client());
        assert_eq!(company.category_label(), "CLIENTE");

        let market = CompanyRef {
            cnpj: "1".to_string(),
            tipo: "mercado".to_string(),
        };
        assert!(!market.is_client());
        assert_eq!(market.category_label(), "MERCADO");
    }

    #[test]
    fn test_states_are_unique_two_letter_codes() {
        let mut codes: Vec<&str> = STATES.iter().map(|(code, _)| *code).collect();
        assert!(codes.iter().all(|c| c.len() == 2));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 27);
    }
}
