//! The closed set of domain operations.
//!
//! [`OperationKind`] is the wire name the model sends; [`Operation`] is the
//! same request after its argument bag has been normalized. Each `from_bag`
//! below owns the alias list for one operation, so the accepted spellings of
//! every field live in exactly one place.

use serde_json::Value;

use crate::args::ArgBag;
use crate::records::TransactionType;

/// Every operation the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    RecordRevenue,
    RecordExpense,
    RecordInvestment,
    RecordWithdrawal,
    PurchaseAnimals,
    SellAnimals,
    RecordBirth,
    RecordDeath,
    RecordWeighing,
    RecordInventory,
    RecordMovement,
    RegisterPasture,
    ManagePasture,
    CompositeAcquisition,
    QueryFinancial,
    QueryMargins,
    QueryPastures,
    QueryHerd,
    QueryHerdDetailed,
    QueryHerdBySex,
    QueryHerdByCategory,
    RequestInfo,
    ClearCache,
    ResetAll,
    ResetHerd,
    ResetFinancial,
    ResetPastures,
}

impl OperationKind {
    pub const ALL: [OperationKind; 27] = [
        OperationKind::RecordRevenue,
        OperationKind::RecordExpense,
        OperationKind::RecordInvestment,
        OperationKind::RecordWithdrawal,
        OperationKind::PurchaseAnimals,
        OperationKind::SellAnimals,
        OperationKind::RecordBirth,
        OperationKind::RecordDeath,
        OperationKind::RecordWeighing,
        OperationKind::RecordInventory,
        OperationKind::RecordMovement,
        OperationKind::RegisterPasture,
        OperationKind::ManagePasture,
        OperationKind::CompositeAcquisition,
        OperationKind::QueryFinancial,
        OperationKind::QueryMargins,
        OperationKind::QueryPastures,
        OperationKind::QueryHerd,
        OperationKind::QueryHerdDetailed,
        OperationKind::QueryHerdBySex,
        OperationKind::QueryHerdByCategory,
        OperationKind::RequestInfo,
        OperationKind::ClearCache,
        OperationKind::ResetAll,
        OperationKind::ResetHerd,
        OperationKind::ResetFinancial,
        OperationKind::ResetPastures,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::RecordRevenue => "registrar_receita",
            OperationKind::RecordExpense => "registrar_despesa",
            OperationKind::RecordInvestment => "registrar_investimento",
            OperationKind::RecordWithdrawal => "registrar_pro_labore",
            OperationKind::PurchaseAnimals => "registrar_compra_animais",
            OperationKind::SellAnimals => "registrar_venda_animais",
            OperationKind::RecordBirth => "registrar_nascimento",
            OperationKind::RecordDeath => "registrar_morte",
            OperationKind::RecordWeighing => "registrar_pesagem",
            OperationKind::RecordInventory => "registrar_inventario_rebanho",
            OperationKind::RecordMovement => "registrar_movimentacao_rebanho",
            OperationKind::RegisterPasture => "registrar_area_pasto",
            OperationKind::ManagePasture => "registrar_manejo_pasto",
            OperationKind::CompositeAcquisition => "operacao_complexa_rebanho",
            OperationKind::QueryFinancial => "consultar_financeiro",
            OperationKind::QueryMargins => "consultar_margens",
            OperationKind::QueryPastures => "consultar_pastagens",
            OperationKind::QueryHerd => "consultar_rebanho",
            OperationKind::QueryHerdDetailed => "consultar_rebanho_detalhado",
            OperationKind::QueryHerdBySex => "consultar_rebanho_por_sexo",
            OperationKind::QueryHerdByCategory => "consultar_rebanho_por_categoria",
            OperationKind::RequestInfo => "solicitar_dados",
            OperationKind::ClearCache => "limpar_cache",
            OperationKind::ResetAll => "resetar_dados",
            OperationKind::ResetHerd => "resetar_rebanho",
            OperationKind::ResetFinancial => "resetar_financeiro",
            OperationKind::ResetPastures => "resetar_pastagens",
        }
    }

    /// Parse a wire name. Accented spellings models sometimes produce are
    /// accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        match name {
            "registrar_pró_labore" => return Some(OperationKind::RecordWithdrawal),
            "registrar_movimentação_rebanho" => return Some(OperationKind::RecordMovement),
            _ => {}
        }
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Wire names of every operation, in catalog order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.as_str()).collect()
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Normalized arguments ─────────────────────────────────────────────────

const HEAD_COUNT: &[&str] = &["quantidade", "qtd", "quantity"];
const CATEGORY: &[&str] = &["categoria", "category"];
const DESCRIPTION: &[&str] = &["descricao", "description"];

/// A plain financial posting.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingArgs {
    pub kind: TransactionType,
    /// Cents.
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
}

impl PostingArgs {
    fn from_bag(kind: TransactionType, bag: &ArgBag<'_>) -> Self {
        Self {
            kind,
            amount: bag.cents(&["valor", "valor_centavos", "amount"]),
            description: bag.text(DESCRIPTION),
            date: bag.date(),
            category: bag.text(&["categoria", "grupo_plano_contas", "category"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseArgs {
    pub head_count: Option<u32>,
    /// Cents, for the whole lot.
    pub total: Option<i64>,
    /// Cents per head.
    pub unit_price: Option<i64>,
    pub category: Option<String>,
    pub average_weight_kg: Option<f64>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl PurchaseArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        Self {
            head_count: bag.count(HEAD_COUNT),
            total: bag.cents(&["valor", "valor_total"]),
            unit_price: bag.cents(&["preco_unitario", "preco", "preco_por_cabeca"]),
            category: bag.text(CATEGORY),
            average_weight_kg: bag.number(&["peso_medio"]),
            date: bag.date(),
            description: bag.text(DESCRIPTION),
        }
    }
}

/// One pasture touched by a sale: how many head left it and, optionally,
/// its new name.
#[derive(Debug, Clone, PartialEq)]
pub struct PastureAllotment {
    pub reference: String,
    pub head_count: Option<u32>,
    pub new_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleArgs {
    pub head_count: Option<u32>,
    /// Cents.
    pub total: Option<i64>,
    pub arrobas_per_head: Option<f64>,
    /// Currency units per arroba.
    pub price_per_arroba: Option<f64>,
    pub animal_ids: Vec<String>,
    pub pastures: Vec<PastureAllotment>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl SaleArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        let arrobas_per_head = bag
            .number(&["peso_medio_arroba", "arrobas"])
            .or_else(|| bag.number(&["peso_medio"]).map(|kg| kg / crate::herd::KG_PER_ARROBA));

        let mut pastures: Vec<PastureAllotment> = bag
            .list(&["pastos"])
            .map(|items| items.iter().filter_map(allotment).collect())
            .unwrap_or_default();
        if pastures.is_empty() {
            if let Some(reference) = bag.text(&["pasto"]) {
                pastures.push(PastureAllotment {
                    reference,
                    head_count: bag.count(&["quantidade_pasto"]),
                    new_name: bag.text(&["novo_nome_pasto", "novo_nome"]),
                });
            }
        }

        Self {
            head_count: bag.count(HEAD_COUNT),
            total: bag.cents(&["valor", "valor_total"]),
            arrobas_per_head,
            price_per_arroba: bag.number(&["preco_por_arroba", "preco_arroba"]),
            animal_ids: bag.strings(&["animal_ids"]),
            pastures,
            category: bag.text(CATEGORY),
            date: bag.date(),
            description: bag.text(DESCRIPTION),
        }
    }
}

fn allotment(item: &Value) -> Option<PastureAllotment> {
    if let Some(name) = item.as_str().map(str::trim).filter(|s| !s.is_empty()) {
        return Some(PastureAllotment {
            reference: name.to_string(),
            head_count: None,
            new_name: None,
        });
    }
    let entry = ArgBag::new(item);
    Some(PastureAllotment {
        reference: entry.text(&["nome", "name", "pasto"])?,
        head_count: entry.count(&["quantidade", "qtd"]),
        new_name: entry.text(&["novo_nome", "novoNome"]),
    })
}

/// Animals entering the herd without a purchase (births, inventory).
#[derive(Debug, Clone, PartialEq)]
pub struct HeadcountArgs {
    pub head_count: Option<u32>,
    pub category: Option<String>,
    pub mother_id: Option<String>,
    pub date: Option<String>,
}

impl HeadcountArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        Self {
            head_count: bag.count(HEAD_COUNT),
            category: bag.text(CATEGORY),
            mother_id: bag.text(&["mother_id", "mae_id"]),
            date: bag.date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementArgs {
    /// `entrada`, `transferencia`...
    pub kind: Option<String>,
    pub destination: Option<String>,
    pub head_count: Option<u32>,
    pub animal_ids: Vec<String>,
    pub category: Option<String>,
    pub date: Option<String>,
}

impl MovementArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        Self {
            kind: bag.text(&["tipo", "tipo_movimentacao"]),
            destination: bag.text(&["pasto_destino", "destino"]),
            head_count: bag.count(HEAD_COUNT),
            animal_ids: bag.strings(&["animal_ids"]),
            category: bag.text(CATEGORY),
            date: bag.date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeathArgs {
    /// Animal id or tag.
    pub animal: Option<String>,
    pub cause: Option<String>,
    pub date: Option<String>,
}

impl DeathArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        Self {
            animal: bag.text(&["animal_id", "brinco"]),
            cause: bag.text(&["causa", "cause"]),
            date: bag.date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeighingArgs {
    /// Animal id or tag.
    pub animal: Option<String>,
    pub weight_kg: Option<f64>,
    pub date: Option<String>,
}

impl WeighingArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        let weight_kg = bag.number(&["peso", "peso_kg"]).or_else(|| {
            bag.number(&["peso_arroba"])
                .map(|arrobas| arrobas * crate::herd::KG_PER_ARROBA)
        });
        Self {
            animal: bag.text(&["animal_id", "brinco"]),
            weight_kg,
            date: bag.date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PastureArgs {
    pub name: Option<String>,
    /// Hectares.
    pub area: Option<f64>,
    /// Animal units per hectare.
    pub capacity: Option<f64>,
    pub kind: Option<String>,
    pub status: Option<String>,
}

impl PastureArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        Self {
            name: bag.text(&["nome", "name", "pastagem", "pasto"]),
            area: bag.number(&["area", "tamanho_ha", "tamanho", "ha", "hectares"]),
            capacity: bag.number(&["capacidade_suporte", "capacidade_ua", "capacidadeUA", "capacity"]),
            kind: bag.text(&["tipo", "tipo_pastagem"]),
            status: bag.text(&["status"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagementArgs {
    pub pasture_id: Option<String>,
    pub pasture_name: Option<String>,
    pub kind: Option<String>,
    /// Cents.
    pub cost: Option<i64>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl ManagementArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        Self {
            pasture_id: bag.text(&["pasture_id", "pasto_id"]),
            pasture_name: bag.text(&["pasto", "nome", "pastagem"]),
            kind: bag.text(&["tipo_manejo", "tipo"]),
            cost: bag.cents(&["custo", "valor"]),
            date: bag.date(),
            description: bag.text(DESCRIPTION),
        }
    }
}

/// A pasture to create as part of a composite acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPastureSpec {
    pub name: Option<String>,
    pub area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeArgs {
    pub pastures: Vec<NewPastureSpec>,
    pub total_animals: Option<u32>,
    pub category: Option<String>,
    /// Cents.
    pub value: Option<i64>,
    pub distribution: Vec<u32>,
    pub average_weight_kg: Option<f64>,
    pub date: Option<String>,
}

impl CompositeArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        let pastures = bag
            .list(&["pastos", "pastagens"])
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let entry = ArgBag::new(item);
                        NewPastureSpec {
                            name: entry.text(&["nome", "name"]),
                            area: entry.number(&["area", "tamanho_ha", "hectares"]),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        let distribution = bag
            .list(&["distribuicao"])
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            pastures,
            total_animals: bag.count(&["total_animais", "quantidade"]),
            category: bag.text(CATEGORY),
            value: bag.cents(&["valor", "valor_total"]),
            distribution,
            average_weight_kg: bag.number(&["peso_medio"]),
            date: bag.date(),
        }
    }
}

/// Optional `inicio`/`fim` bounds for financial queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodArgs {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl PeriodArgs {
    fn from_bag(bag: &ArgBag<'_>) -> Self {
        Self {
            start: bag.text(&["inicio", "data_inicio", "start"]),
            end: bag.text(&["fim", "data_fim", "end"]),
        }
    }
}

/// Read-only reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Financial(PeriodArgs),
    Margins(PeriodArgs),
    Pastures,
    Herd,
    HerdDetailed,
    HerdBySex,
    HerdByCategory,
}

/// What a reset wipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Everything, then the catalogs are seeded again.
    All,
    Herd,
    Financial,
    Pastures,
}

/// A fully normalized request.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Posting(PostingArgs),
    Purchase(PurchaseArgs),
    Sale(SaleArgs),
    Birth(HeadcountArgs),
    Inventory(HeadcountArgs),
    Movement(MovementArgs),
    Death(DeathArgs),
    Weighing(WeighingArgs),
    RegisterPasture(PastureArgs),
    ManagePasture(ManagementArgs),
    Composite(CompositeArgs),
    Query(Query),
    RequestInfo(Option<String>),
    Reset(ResetScope),
}

impl Operation {
    /// Normalize an argument bag for `kind`.
    pub fn from_args(kind: OperationKind, args: &Value) -> Self {
        let bag = ArgBag::new(args);
        match kind {
            OperationKind::RecordRevenue => {
                Operation::Posting(PostingArgs::from_bag(TransactionType::Revenue, &bag))
            }
            OperationKind::RecordExpense => {
                Operation::Posting(PostingArgs::from_bag(TransactionType::Expense, &bag))
            }
            OperationKind::RecordInvestment => {
                Operation::Posting(PostingArgs::from_bag(TransactionType::Investment, &bag))
            }
            OperationKind::RecordWithdrawal => {
                Operation::Posting(PostingArgs::from_bag(TransactionType::Withdrawal, &bag))
            }
            OperationKind::PurchaseAnimals => Operation::Purchase(PurchaseArgs::from_bag(&bag)),
            OperationKind::SellAnimals => Operation::Sale(SaleArgs::from_bag(&bag)),
            OperationKind::RecordBirth => Operation::Birth(HeadcountArgs::from_bag(&bag)),
            OperationKind::RecordInventory => Operation::Inventory(HeadcountArgs::from_bag(&bag)),
            OperationKind::RecordMovement => Operation::Movement(MovementArgs::from_bag(&bag)),
            OperationKind::RecordDeath => Operation::Death(DeathArgs::from_bag(&bag)),
            OperationKind::RecordWeighing => Operation::Weighing(WeighingArgs::from_bag(&bag)),
            OperationKind::RegisterPasture => Operation::RegisterPasture(PastureArgs::from_bag(&bag)),
            OperationKind::ManagePasture => Operation::ManagePasture(ManagementArgs::from_bag(&bag)),
            OperationKind::CompositeAcquisition => Operation::Composite(CompositeArgs::from_bag(&bag)),
            OperationKind::QueryFinancial => Operation::Query(Query::Financial(PeriodArgs::from_bag(&bag))),
            OperationKind::QueryMargins => Operation::Query(Query::Margins(PeriodArgs::from_bag(&bag))),
            OperationKind::QueryPastures => Operation::Query(Query::Pastures),
            OperationKind::QueryHerd => {
                // "tenho 30 vacas" often arrives as a herd query carrying a count.
                let headcount = HeadcountArgs::from_bag(&bag);
                if headcount.category.is_some() && headcount.head_count.is_some_and(|n| n > 0) {
                    Operation::Inventory(headcount)
                } else {
                    Operation::Query(Query::Herd)
                }
            }
            OperationKind::QueryHerdDetailed => Operation::Query(Query::HerdDetailed),
            OperationKind::QueryHerdBySex => Operation::Query(Query::HerdBySex),
            OperationKind::QueryHerdByCategory => Operation::Query(Query::HerdByCategory),
            OperationKind::RequestInfo => {
                Operation::RequestInfo(bag.text(&["mensagem", "message", "pergunta"]))
            }
            OperationKind::ClearCache | OperationKind::ResetAll => Operation::Reset(ResetScope::All),
            OperationKind::ResetHerd => Operation::Reset(ResetScope::Herd),
            OperationKind::ResetFinancial => Operation::Reset(ResetScope::Financial),
            OperationKind::ResetPastures => Operation::Reset(ResetScope::Pastures),
        }
    }

    /// Whether running this operation can change stored state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::Query(_) | Operation::RequestInfo(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(
            OperationKind::from_name("registrar_pró_labore"),
            Some(OperationKind::RecordWithdrawal)
        );
        assert_eq!(OperationKind::from_name("vender_fazenda"), None);
    }

    #[test]
    fn pasture_aliases() {
        let op = Operation::from_args(
            OperationKind::RegisterPasture,
            &json!({"pastagem": "Pasto 1", "tamanho_ha": "40", "capacidadeUA": 1.5}),
        );
        let Operation::RegisterPasture(args) = op else {
            panic!("expected pasture registration");
        };
        assert_eq!(args.name.as_deref(), Some("Pasto 1"));
        assert_eq!(args.area, Some(40.0));
        assert_eq!(args.capacity, Some(1.5));
    }

    #[test]
    fn sale_derives_arrobas_from_kilograms() {
        let op = Operation::from_args(
            OperationKind::SellAnimals,
            &json!({"quantidade": 50, "peso_medio": 105, "preco_arroba": 340}),
        );
        let Operation::Sale(args) = op else {
            panic!("expected sale");
        };
        assert_eq!(args.arrobas_per_head, Some(7.0));
        assert_eq!(args.price_per_arroba, Some(340.0));
    }

    #[test]
    fn sale_pasture_list_and_single_pasture() {
        let Operation::Sale(list) = Operation::from_args(
            OperationKind::SellAnimals,
            &json!({"pastos": [{"nome": "pasto 1", "qtd": 15, "novoNome": "Retiro"}, "pasto 2", {}]}),
        ) else {
            panic!("expected sale");
        };
        assert_eq!(list.pastures.len(), 2);
        assert_eq!(list.pastures[0].head_count, Some(15));
        assert_eq!(list.pastures[0].new_name.as_deref(), Some("Retiro"));
        assert_eq!(list.pastures[1].reference, "pasto 2");

        let Operation::Sale(single) = Operation::from_args(
            OperationKind::SellAnimals,
            &json!({"pasto": "sede", "quantidade_pasto": 5, "novo_nome_pasto": "Sede Velha"}),
        ) else {
            panic!("expected sale");
        };
        assert_eq!(
            single.pastures,
            vec![PastureAllotment {
                reference: "sede".into(),
                head_count: Some(5),
                new_name: Some("Sede Velha".into()),
            }]
        );
    }

    #[test]
    fn herd_query_with_count_becomes_inventory() {
        let op = Operation::from_args(
            OperationKind::QueryHerd,
            &json!({"categoria": "VACA", "quantidade": 30}),
        );
        assert!(matches!(op, Operation::Inventory(ref a) if a.head_count == Some(30)));

        let op = Operation::from_args(OperationKind::QueryHerd, &json!({}));
        assert_eq!(op, Operation::Query(Query::Herd));
        assert!(!op.is_mutation());

        let op = Operation::from_args(
            OperationKind::QueryHerd,
            &json!({"categoria": "VACA", "quantidade": 30}),
        );
        assert!(op.is_mutation());
        assert!(!Operation::RequestInfo(None).is_mutation());
    }

    #[test]
    fn weighing_accepts_arrobas() {
        let Operation::Weighing(args) = Operation::from_args(
            OperationKind::RecordWeighing,
            &json!({"animal_id": "VACA-0001", "peso_arroba": 20}),
        ) else {
            panic!("expected weighing");
        };
        assert_eq!(args.weight_kg, Some(300.0));
    }

    #[test]
    fn composite_lists() {
        let Operation::Composite(args) = Operation::from_args(
            OperationKind::CompositeAcquisition,
            &json!({
                "pastos": [{"nome": "Pasto A", "area": 40}, {"nome": "Pasto B", "area": 40}],
                "total_animais": 100,
                "valor": 15_000_000,
                "distribuicao": [50, 50]
            }),
        ) else {
            panic!("expected composite");
        };
        assert_eq!(args.pastures.len(), 2);
        assert_eq!(args.pastures[1].area, Some(40.0));
        assert_eq!(args.distribution, vec![50, 50]);
        assert_eq!(args.value, Some(15_000_000));
    }
}
