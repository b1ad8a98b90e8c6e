use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;

use requestdesk_core::config::{COST_CENTERS_FILE, PRODUCTS_FILE, REQUESTS_FILE};
use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter, ProductId};
use requestdesk_core::domain::request::{LineItem, Request, RequestFields, RequestId};

use crate::collection::{JsonCollection, Record};
use crate::repositories::{
    StoreError, COST_CENTERS_COLLECTION, PRODUCTS_COLLECTION, REQUESTS_COLLECTION,
};

/// Reference data and a handful of sample requests for a fresh data directory.
#[derive(Clone, Debug, PartialEq)]
pub struct SeedDataset {
    pub products: Vec<CatalogProduct>,
    pub cost_centers: Vec<CostCenter>,
    pub requests: Vec<Request>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

const PRODUCTS: &[(i64, &str, i64)] = &[
    (1, "Laptop", 129_999),
    (2, "Phone", 79_999),
    (3, "Tablet", 49_999),
    (4, "Smartwatch", 19_999),
];

const COST_CENTERS: &[(i64, &str, &str)] = &[
    (1, "CC100", "CC100 - Information Technology"),
    (2, "CC200", "CC200 - Finance"),
    (3, "CC300", "CC300 - Operations"),
    (4, "CC400", "CC400 - Human Resources"),
];

struct SampleRequest {
    requestor_name: &'static str,
    requestor_email: &'static str,
    department: &'static str,
    employee_id: &'static str,
    title: &'static str,
    description: &'static str,
    priority: &'static str,
    product: usize,
    quantity: u32,
    budget: i64,
    cost_center: &'static str,
    created: (i32, u32, u32),
}

const SAMPLE_REQUESTS: &[SampleRequest] = &[
    SampleRequest {
        requestor_name: "Maya Chen",
        requestor_email: "maya.chen@example.com",
        department: "Engineering",
        employee_id: "E-1042",
        title: "Developer laptop refresh",
        description: "Replace two laptops that are out of warranty.",
        priority: "high",
        product: 0,
        quantity: 2,
        budget: 2_800,
        cost_center: "CC100",
        created: (2024, 1, 15),
    },
    SampleRequest {
        requestor_name: "Omar Haddad",
        requestor_email: "omar.haddad@example.com",
        department: "Finance",
        employee_id: "E-2210",
        title: "Field phones for auditors",
        description: "Phones for the quarterly on-site audit team.",
        priority: "medium",
        product: 1,
        quantity: 3,
        budget: 2_500,
        cost_center: "CC200",
        created: (2024, 1, 29),
    },
    SampleRequest {
        requestor_name: "Lena Novak",
        requestor_email: "lena.novak@example.com",
        department: "Operations",
        employee_id: "E-3307",
        title: "Warehouse tablets",
        description: "Tablets for inventory scanning on the floor.",
        priority: "low",
        product: 2,
        quantity: 4,
        budget: 2_000,
        cost_center: "CC300",
        created: (2024, 2, 6),
    },
];

impl SeedDataset {
    pub fn standard() -> Self {
        let products: Vec<CatalogProduct> = PRODUCTS
            .iter()
            .map(|(id, label, cents)| CatalogProduct {
                id: ProductId(*id),
                label: (*label).to_string(),
                price: Decimal::new(*cents, 2),
            })
            .collect();

        let cost_centers = COST_CENTERS
            .iter()
            .map(|(id, value, label)| CostCenter {
                id: *id,
                value: (*value).to_string(),
                label: (*label).to_string(),
            })
            .collect();

        let requests = SAMPLE_REQUESTS
            .iter()
            .zip(1..)
            .filter_map(|(sample, id)| {
                let product = products.get(sample.product)?;
                let (year, month, day) = sample.created;
                Some(Request::new(RequestId(id), sample.fields(product)?, noon_utc(year, month, day)?))
            })
            .collect();

        Self { products, cost_centers, requests }
    }
}

impl SampleRequest {
    fn fields(&self, product: &CatalogProduct) -> Option<RequestFields> {
        let line_item = LineItem::new(product.label.clone(), self.quantity, product.price).ok()?;
        Some(RequestFields {
            requestor_name: self.requestor_name.to_string(),
            requestor_email: self.requestor_email.to_string(),
            department: self.department.to_string(),
            employee_id: self.employee_id.to_string(),
            on_behalf_of: None,
            request_title: self.title.to_string(),
            description: self.description.to_string(),
            requested_date: format!("{}-{:02}-{:02}", self.created.0, self.created.1, self.created.2),
            due_date: None,
            priority: self.priority.to_string(),
            products: vec![line_item],
            budget: Decimal::from(self.budget),
            cost_center: self.cost_center.to_string(),
            attachments: Vec::new(),
        })
    }
}

fn noon_utc(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).single()
}

/// Writes the dataset into `data_dir`. Existing files are never overwritten;
/// sample requests are written only when `include_requests` is set, otherwise
/// an empty requests document is created.
pub async fn seed_data_dir(
    data_dir: &Path,
    dataset: &SeedDataset,
    include_requests: bool,
) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    let requests = if include_requests { dataset.requests.clone() } else { Vec::new() };
    seed_collection(
        JsonCollection::new(PRODUCTS_COLLECTION, data_dir.join(PRODUCTS_FILE)),
        dataset.products.clone(),
        &mut report,
    )
    .await?;
    seed_collection(
        JsonCollection::new(COST_CENTERS_COLLECTION, data_dir.join(COST_CENTERS_FILE)),
        dataset.cost_centers.clone(),
        &mut report,
    )
    .await?;
    seed_collection(
        JsonCollection::new(REQUESTS_COLLECTION, data_dir.join(REQUESTS_FILE)),
        requests,
        &mut report,
    )
    .await?;

    Ok(report)
}

async fn seed_collection<T: Record>(
    collection: JsonCollection<T>,
    records: Vec<T>,
    report: &mut SeedReport,
) -> Result<(), StoreError> {
    let path = collection.path().to_path_buf();
    if tokio::fs::try_exists(&path)
        .await
        .map_err(|source| StoreError::Io { path: path.clone(), source })?
    {
        info!(
            event_name = "store.seed.skipped",
            collection = collection.name(),
            path = %path.display(),
            "collection document already exists"
        );
        report.skipped.push(path);
        return Ok(());
    }

    let count = records.len();
    collection
        .mutate(move |existing| {
            *existing = records;
            Ok(())
        })
        .await?;

    info!(
        event_name = "store.seed.written",
        collection = collection.name(),
        records = count,
        "collection document seeded"
    );
    report.written.push(path);
    Ok(())
}
