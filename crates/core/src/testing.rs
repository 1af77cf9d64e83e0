//! Fixtures shared by unit tests.

use crate::models::{Hero, TimelineEntry};

pub(crate) fn hero(id: i64, name: &str) -> Hero {
    Hero {
        id,
        name: name.to_string(),
        rank: "Рядовой".to_string(),
        image: format!("https://example.com/{id}.jpg"),
        period: "1900-1950".to_string(),
        conflict: "Великая Отечественная война".to_string(),
        region: "Московская область".to_string(),
        awards: vec!["Орден Ленина".to_string()],
        birth_year: 1900,
        biography: "Биография".to_string(),
        timeline: vec![TimelineEntry {
            year: 1941,
            event: "Призван".to_string(),
        }],
    }
}

pub(crate) fn sample_heroes() -> Vec<Hero> {
    let mut maresyev = hero(1, "Алексей Петрович Маресьев");
    maresyev.rank = "Лётчик-истребитель".to_string();
    maresyev.period = "1916-2001".to_string();
    maresyev.region = "Волгоградская область".to_string();
    maresyev.birth_year = 1916;
    maresyev.awards = vec![
        "Герой Советского Союза".to_string(),
        "Орден Ленина".to_string(),
        "Орден Красного Знамени".to_string(),
    ];
    maresyev.timeline = vec![
        TimelineEntry {
            year: 1941,
            event: "Призван в РККА".to_string(),
        },
        TimelineEntry {
            year: 1942,
            event: "Тяжелое ранение, ампутация ног".to_string(),
        },
        TimelineEntry {
            year: 1943,
            event: "Возвращение в строй".to_string(),
        },
    ];

    let mut zoya = hero(2, "Зоя Анатольевна Космодемьянская");
    zoya.rank = "Партизанка-диверсант".to_string();
    zoya.period = "1923-1941".to_string();
    zoya.region = "Тамбовская область".to_string();
    zoya.birth_year = 1923;

    let mut pokryshkin = hero(3, "Александр Иванович Покрышкин");
    pokryshkin.rank = "Маршал авиации".to_string();
    pokryshkin.period = "1913-1985".to_string();
    pokryshkin.region = "Новосибирская область".to_string();
    pokryshkin.birth_year = 1913;

    let mut chechnya = hero(4, "Сергей Иванович Петров");
    chechnya.rank = "Сержант".to_string();
    chechnya.period = "1975-1995".to_string();
    chechnya.conflict = "Чечня".to_string();
    chechnya.region = "Тамбовская область".to_string();
    chechnya.birth_year = 1975;
    chechnya.awards = vec!["Герой Российской Федерации".to_string()];

    let mut afghan = hero(5, "Николай Васильевич Кузнецов");
    afghan.rank = "Старший лейтенант".to_string();
    afghan.period = "1957-1985".to_string();
    afghan.conflict = "Афганистан".to_string();
    afghan.region = "Ленинградская область".to_string();
    afghan.birth_year = 1957;

    vec![maresyev, zoya, pokryshkin, chechnya, afghan]
}
