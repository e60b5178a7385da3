use serde::{Serialize, Serializer};
use smol_str::SmolStr;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Paging and sorting shared by every list endpoint.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub sort_by: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct NftQuery {
    #[serde(flatten)]
    #[builder(default)]
    pub page: QueryOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub nft_id: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub collection_id: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub network_symbol: Option<SmolStr>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuery {
    #[serde(flatten)]
    #[builder(default)]
    pub page: QueryOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub network_symbol: Option<SmolStr>,
    /// Sent as one comma-separated parameter
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "comma_joined")]
    #[builder(default)]
    pub token_ids: Vec<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_balance: Option<f64>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct DomainQuery {
    #[serde(flatten)]
    #[builder(default)]
    pub page: QueryOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub extension: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub network_symbol: Option<SmolStr>,
}

fn comma_joined<S: Serializer>(ids: &[SmolStr], serializer: S) -> Result<S::Ok, S::Error> {
    let joined = ids.iter().map(SmolStr::as_str).collect::<Vec<_>>().join(",");
    serializer.serialize_str(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_serializes_to_nothing() {
        assert_eq!(serde_html_form::to_string(NftQuery::default()).unwrap(), "");
    }

    #[test]
    fn camel_case_names_and_flattened_paging() {
        let query = NftQuery::builder()
            .page(
                QueryOptions::builder()
                    .skip(10)
                    .take(5)
                    .sort_by("name")
                    .sort_direction(SortDirection::Desc)
                    .build(),
            )
            .collection_id("c-1")
            .build();
        let encoded = serde_html_form::to_string(&query).unwrap();
        assert_eq!(
            encoded,
            "skip=10&take=5&sortBy=name&sortDirection=DESC&collectionId=c-1"
        );
    }

    #[test]
    fn token_ids_are_comma_joined() {
        let query = TokenQuery::builder()
            .token_ids(vec!["a".into(), "b".into()])
            .network_symbol("SOL")
            .build();
        let encoded = serde_html_form::to_string(&query).unwrap();
        assert_eq!(encoded, "networkSymbol=SOL&tokenIds=a%2Cb");
    }
}
