// ==========================================
// 危废桶监控系统 - 演示数据初始化
// ==========================================
// 用法: seed_demo_data [db_path]
// 幂等: 已存在的企业 (按税号) 与容器 (按编号) 跳过
// ==========================================

use anyhow::{Context, Result};

use bombona_monitor::api::ApiError;
use bombona_monitor::app::{get_default_db_path, AppState};
use bombona_monitor::domain::{Company, Container};
use bombona_monitor::repository::CompanyRepository;

const DEMO_CAPACITY_KG: f64 = 200.0;

struct DemoCompany {
    company_id: &'static str,
    name: &'static str,
    cnpj: &'static str,
    city: &'static str,
}

struct DemoContainer {
    container_id: &'static str,
    company_id: &'static str,
    latitude: f64,
    longitude: f64,
    address: &'static str,
    waste_type: &'static str,
}

const COMPANIES: &[DemoCompany] = &[
    DemoCompany { company_id: "EMP-01", name: "Hospital e Maternidade São Francisco - Cianorte", cnpj: "75.123.456/0001-10", city: "Cianorte" },
    DemoCompany { company_id: "EMP-02", name: "Hospital Universitário Regional de Maringá - UEM", cnpj: "75.234.567/0001-11", city: "Maringá" },
    DemoCompany { company_id: "EMP-03", name: "Santa Casa de Maringá", cnpj: "75.345.678/0001-12", city: "Maringá" },
    DemoCompany { company_id: "EMP-04", name: "Hospital São Paulo - Umuarama", cnpj: "75.456.789/0001-13", city: "Umuarama" },
    DemoCompany { company_id: "EMP-05", name: "Hospital e Maternidade Paraná - Paranavaí", cnpj: "75.567.890/0001-14", city: "Paranavaí" },
    DemoCompany { company_id: "EMP-06", name: "Clínica e Hospital São Vicente - Campo Mourão", cnpj: "75.678.901/0001-15", city: "Campo Mourão" },
    DemoCompany { company_id: "EMP-07", name: "Hospital Regional do Noroeste - Paranavaí", cnpj: "75.789.012/0001-16", city: "Paranavaí" },
    DemoCompany { company_id: "EMP-08", name: "Hospital Santa Rita - Maringá", cnpj: "75.890.123/0001-17", city: "Maringá" },
];

const CONTAINERS: &[DemoContainer] = &[
    DemoContainer { container_id: "CNT-HOS-001", company_id: "EMP-01", latitude: -23.6636, longitude: -52.6056, address: "Av. Souza Naves, 1234 - UTI Ala A", waste_type: "hospitalar_infectante" },
    DemoContainer { container_id: "CNT-HOS-002", company_id: "EMP-01", latitude: -23.6640, longitude: -52.6050, address: "Av. Souza Naves, 1234 - Centro Cirúrgico", waste_type: "hospitalar_perfurocortante" },
    DemoContainer { container_id: "MGA-UEM-001", company_id: "EMP-02", latitude: -23.4205, longitude: -51.9331, address: "Av. Mandacaru, 1590 - Pronto Socorro", waste_type: "hospitalar_infectante" },
    DemoContainer { container_id: "MGA-UEM-002", company_id: "EMP-02", latitude: -23.4209, longitude: -51.9335, address: "Av. Mandacaru, 1590 - Laboratório", waste_type: "hospitalar_quimico" },
    DemoContainer { container_id: "MGA-STC-001", company_id: "EMP-03", latitude: -23.4252, longitude: -51.9392, address: "Rua XV de Novembro, 1423 - Emergência", waste_type: "hospitalar_infectante" },
    DemoContainer { container_id: "MGA-STC-002", company_id: "EMP-03", latitude: -23.4248, longitude: -51.9388, address: "Rua XV de Novembro, 1423 - Maternidade", waste_type: "hospitalar_perfurocortante" },
    DemoContainer { container_id: "UMU-HOS-001", company_id: "EMP-04", latitude: -23.7665, longitude: -53.3250, address: "Av. Rio Branco, 3355 - Central", waste_type: "hospitalar_infectante" },
    DemoContainer { container_id: "PNV-PAR-001", company_id: "EMP-05", latitude: -23.0732, longitude: -52.4652, address: "Rua Getúlio Vargas, 777 - Ala Sul", waste_type: "hospitalar_infectante" },
    DemoContainer { container_id: "CMO-SVC-001", company_id: "EMP-06", latitude: -24.0462, longitude: -52.3786, address: "Av. Capitão Índio Bandeira, 1050", waste_type: "hospitalar_quimico" },
    DemoContainer { container_id: "PNV-REG-001", company_id: "EMP-07", latitude: -23.0777, longitude: -52.4585, address: "Rua Piauí, 550 - Ala Norte", waste_type: "hospitalar_perfurocortante" },
    DemoContainer { container_id: "MGA-STR-001", company_id: "EMP-08", latitude: -23.4095, longitude: -51.9552, address: "Av. Colombo, 2222 - UTI", waste_type: "hospitalar_infectante" },
    DemoContainer { container_id: "MGA-STR-002", company_id: "EMP-08", latitude: -23.4099, longitude: -51.9548, address: "Av. Colombo, 2222 - Centro Cirúrgico", waste_type: "hospitalar_quimico" },
];

fn main() -> Result<()> {
    bombona_monitor::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path.clone()).map_err(anyhow::Error::msg)?;
    let company_repo = CompanyRepository::from_connection(state.conn.clone());

    let mut companies_created = 0;
    for demo in COMPANIES {
        if company_repo.find_by_cnpj(demo.cnpj)?.is_some() {
            continue;
        }
        let mut company = Company::new(demo.company_id, demo.name, demo.cnpj);
        company.city = Some(demo.city.to_string());
        state
            .monitor_api
            .register_company(&company)
            .with_context(|| format!("登记企业失败: {}", demo.name))?;
        companies_created += 1;
    }

    let mut containers_created = 0;
    for demo in CONTAINERS {
        match state.monitor_api.get_container(demo.container_id) {
            Ok(_) => continue,
            Err(ApiError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let container = Container::new(
            demo.container_id.to_string(),
            demo.company_id.to_string(),
            DEMO_CAPACITY_KG,
            demo.waste_type.to_string(),
        )
        .with_location(demo.address, demo.latitude, demo.longitude);

        state
            .monitor_api
            .register_container(container)
            .with_context(|| format!("登记容器失败: {}", demo.container_id))?;
        containers_created += 1;
    }

    println!("数据库: {}", db_path);
    println!(
        "新建企业 {} 家, 新建容器 {} 个 (演示共 {} 家 / {} 个)",
        companies_created,
        containers_created,
        COMPANIES.len(),
        CONTAINERS.len()
    );
    Ok(())
}
